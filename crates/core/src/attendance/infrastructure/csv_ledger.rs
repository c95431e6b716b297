use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::attendance::domain::attendance_ledger::{AttendanceLedger, DedupPolicy};
use crate::attendance::domain::attendance_record::{AttendanceRecord, DATE_FORMAT};
use crate::attendance::infrastructure::csv_format::{encode_row, parse_row, HEADER};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("failed to read ledger {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write ledger {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Attendance ledger stored as a CSV file with a `Name,Date,Time` header.
///
/// Rows are only ever appended. Under [`DedupPolicy::PerDay`] the
/// `(name, date)` pairs already on disk are indexed when the ledger is
/// opened, so duplicate checks never touch the file. Assumes it is the only
/// writer for the lifetime of the value.
pub struct CsvLedger {
    path: PathBuf,
    policy: DedupPolicy,
    index: HashSet<(String, NaiveDate)>,
}

impl CsvLedger {
    pub fn open(path: impl Into<PathBuf>, policy: DedupPolicy) -> Result<Self, LedgerError> {
        let path = path.into();
        let index = match policy {
            DedupPolicy::PerDay => load_index(&path)?,
            DedupPolicy::Substring => HashSet::new(),
        };
        log::debug!(
            "Opened ledger {} ({:?}, {} indexed entries)",
            path.display(),
            policy,
            index.len()
        );
        Ok(Self {
            path,
            policy,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn policy(&self) -> DedupPolicy {
        self.policy
    }

    /// Writes the header if the file is missing or empty.
    pub fn write_header_if_missing(&self) -> Result<(), LedgerError> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == io::ErrorKind::NotFound => true,
            Err(e) => return Err(self.read_err(e)),
        };
        if !needs_header {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.write_err(e))?;
        }
        fs::write(&self.path, encode_row(&HEADER)).map_err(|e| self.write_err(e))?;
        log::info!("Created ledger {}", self.path.display());
        Ok(())
    }

    pub fn contains(&self, record: &AttendanceRecord) -> Result<bool, LedgerError> {
        match self.policy {
            DedupPolicy::PerDay => Ok(self.index.contains(&(record.name.clone(), record.date))),
            DedupPolicy::Substring => {
                let content = match fs::read_to_string(&self.path) {
                    Ok(content) => content,
                    Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
                    Err(e) => return Err(self.read_err(e)),
                };
                Ok(content.lines().any(|line| line.contains(record.name.as_str())))
            }
        }
    }

    /// Header bootstrap, duplicate check, then a single appended row.
    pub fn record(&mut self, record: &AttendanceRecord) -> Result<bool, LedgerError> {
        self.write_header_if_missing()?;
        if self.contains(record)? {
            log::debug!("{} already marked on {}", record.name, record.date_string());
            return Ok(false);
        }

        let date = record.date_string();
        let time = record.time_string();
        let mut row = encode_row(&[record.name.as_str(), date.as_str(), time.as_str()]);

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_err(e))?;
        if lacks_final_newline(&mut file).map_err(|e| self.read_err(e))? {
            row.insert(0, '\n');
        }
        file.write_all(row.as_bytes())
            .map_err(|e| self.write_err(e))?;

        if self.policy == DedupPolicy::PerDay {
            self.index.insert((record.name.clone(), record.date));
        }
        log::info!("Marked {} at {} {}", record.name, date, time);
        Ok(true)
    }

    fn read_err(&self, source: io::Error) -> LedgerError {
        LedgerError::Read {
            path: self.path.clone(),
            source,
        }
    }

    fn write_err(&self, source: io::Error) -> LedgerError {
        LedgerError::Write {
            path: self.path.clone(),
            source,
        }
    }
}

impl AttendanceLedger for CsvLedger {
    fn ensure_header(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(self.write_header_if_missing()?)
    }

    fn is_already_marked(
        &mut self,
        record: &AttendanceRecord,
    ) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(self.contains(record)?)
    }

    fn append(&mut self, record: &AttendanceRecord) -> Result<bool, Box<dyn std::error::Error>> {
        Ok(self.record(record)?)
    }
}

/// True when the file is non-empty and its last byte is not `\n`.
fn lacks_final_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

/// `(name, date)` pairs of every well-formed data row. A missing file is an
/// empty index.
fn load_index(path: &Path) -> Result<HashSet<(String, NaiveDate)>, LedgerError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
        Err(e) => {
            return Err(LedgerError::Read {
                path: path.to_path_buf(),
                source: e,
            })
        }
    };

    let mut index = HashSet::new();
    for (line_no, line) in content.lines().enumerate().skip(1) {
        let fields = parse_row(line);
        let parsed = match fields.as_slice() {
            [name, date, ..] => NaiveDate::parse_from_str(date, DATE_FORMAT)
                .ok()
                .map(|d| (name.clone(), d)),
            _ => None,
        };
        match parsed {
            Some(key) => {
                index.insert(key);
            }
            None if line.trim().is_empty() => {}
            None => log::warn!(
                "Skipping malformed ledger line {} in {}",
                line_no + 1,
                path.display()
            ),
        }
    }
    Ok(index)
}
