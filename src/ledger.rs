use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};

use crate::fields::{FieldKey, FieldSpec, invoice_fields};
use crate::form::Record;

#[derive(Debug)]
pub enum LedgerError {
    PermissionDenied { path: PathBuf },
    Io { path: PathBuf, source: std::io::Error },
    Csv { path: PathBuf, source: csv::Error },
    MissingField { field: FieldKey },
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::PermissionDenied { path } => {
                write!(f, "Permission denied accessing file: {}", path.display())
            }
            LedgerError::Io { path, source } => {
                write!(f, "ledger file {} is inaccessible: {source}", path.display())
            }
            LedgerError::Csv { path, source } => {
                write!(f, "failed writing ledger row to {}: {source}", path.display())
            }
            LedgerError::MissingField { field } => {
                write!(f, "record is missing the declared column {field}")
            }
        }
    }
}

impl std::error::Error for LedgerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LedgerError::Io { source, .. } => Some(source),
            LedgerError::Csv { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Append-only yearly invoice ledger. One file per calendar year, the column
/// order fixed to the field table's declaration order, a header row on first
/// write, exactly one row per saved record.
pub struct CsvLedger {
    path: PathBuf,
    columns: &'static [FieldSpec],
}

impl CsvLedger {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        Self::for_year(dir, Local::now().year())
    }

    pub fn for_year(dir: impl AsRef<Path>, year: i32) -> Result<Self, LedgerError> {
        let path = dir.as_ref().join(format!("knjiga_racunov_{year}.csv"));
        let ledger = Self {
            path,
            columns: invoice_fields(),
        };
        ledger.check_access()?;
        Ok(ledger)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Access problems surface at construction, not on the first save.
    fn check_access(&self) -> Result<(), LedgerError> {
        if self.path.exists() {
            let metadata = std::fs::metadata(&self.path).map_err(|source| LedgerError::Io {
                path: self.path.clone(),
                source,
            })?;
            if metadata.permissions().readonly() {
                return Err(LedgerError::PermissionDenied {
                    path: self.path.clone(),
                });
            }
        } else {
            let parent = match self.path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
                _ => PathBuf::from("."),
            };
            let metadata = std::fs::metadata(&parent).map_err(|source| LedgerError::Io {
                path: parent.clone(),
                source,
            })?;
            if metadata.permissions().readonly() {
                return Err(LedgerError::PermissionDenied {
                    path: self.path.clone(),
                });
            }
        }
        Ok(())
    }

    /// Appends one record as one row; the header row of column names is
    /// written only when the file does not exist yet.
    pub fn save_record(&self, record: &Record) -> Result<(), LedgerError> {
        let new_file = !self.path.exists();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| match source.kind() {
                ErrorKind::PermissionDenied => LedgerError::PermissionDenied {
                    path: self.path.clone(),
                },
                _ => LedgerError::Io {
                    path: self.path.clone(),
                    source,
                },
            })?;
        let mut writer = csv::Writer::from_writer(file);
        if new_file {
            writer
                .write_record(self.columns.iter().map(|spec| spec.key.as_str()))
                .map_err(|source| LedgerError::Csv {
                    path: self.path.clone(),
                    source,
                })?;
        }
        let mut row = Vec::with_capacity(self.columns.len());
        for spec in self.columns {
            let value = record
                .get(&spec.key)
                .ok_or(LedgerError::MissingField { field: spec.key })?;
            row.push(value.to_string());
        }
        writer.write_record(&row).map_err(|source| LedgerError::Csv {
            path: self.path.clone(),
            source,
        })?;
        writer.flush().map_err(|source| LedgerError::Io {
            path: self.path.clone(),
            source,
        })?;
        tracing::info!(path = %self.path.display(), "appended invoice row to ledger");
        Ok(())
    }
}
