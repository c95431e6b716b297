use chrono::NaiveDateTime;

/// Source of the wall-clock time stamped onto attendance records.
pub trait Clock: Send {
    fn now(&self) -> NaiveDateTime;
}
