use crate::attendance::domain::attendance_record::AttendanceRecord;

/// How the ledger decides a record would be a duplicate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DedupPolicy {
    /// One row per name per date, looked up in an in-memory index.
    #[default]
    PerDay,
    /// Any existing line containing the name as a substring blocks it,
    /// on every date. Rescans the file on each check.
    Substring,
}

/// Append-only attendance store.
pub trait AttendanceLedger: Send {
    /// Create the ledger with its header row if it doesn't exist yet.
    fn ensure_header(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    fn is_already_marked(
        &mut self,
        record: &AttendanceRecord,
    ) -> Result<bool, Box<dyn std::error::Error>>;

    /// Append `record` unless it is already marked.
    ///
    /// Returns whether a row was written.
    fn append(&mut self, record: &AttendanceRecord) -> Result<bool, Box<dyn std::error::Error>>;
}
