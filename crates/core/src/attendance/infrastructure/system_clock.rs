use chrono::NaiveDateTime;

use crate::attendance::domain::clock::Clock;

/// Local wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_is_current_local_date() {
        let before = chrono::Local::now().naive_local();
        let now = SystemClock.now();
        let after = chrono::Local::now().naive_local();
        assert!(before <= now && now <= after);
    }
}
