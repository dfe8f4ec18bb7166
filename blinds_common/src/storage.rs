//! Byte store interface for the persisted position record.
//!
//! The motion engine never touches files directly; it goes through a
//! `ByteStore`, which makes the crash-safety protocol testable with an
//! in-memory store and fault injection.

use crate::motor::types::PositionRecord;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by byte store operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Record path
        path: PathBuf,
        /// Source I/O error
        #[source]
        source: std::io::Error,
    },

    /// Record exists but is not exactly one record long
    #[error("Record {path:?} has {len} bytes, expected a 4-byte record")]
    Corrupt {
        /// Record path
        path: PathBuf,
        /// Bytes found
        len: usize,
    },

    /// Record could not be encoded
    #[error("Failed to encode record: {0}")]
    Encode(String),

    /// Fault injected by a test store
    #[error("Injected fault: {0}")]
    Injected(String),
}

impl StorageError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// File operations the position store consumes.
///
/// `read_record` returns `Ok(None)` when the record does not exist and
/// `delete` succeeds when the record is already absent.
pub trait ByteStore: Send {
    /// Whether a record exists at `path`.
    fn exists(&self, path: &Path) -> Result<bool, StorageError>;

    /// Create an empty record file, truncating any existing one.
    fn create_empty(&mut self, path: &Path) -> Result<(), StorageError>;

    /// Read the record at `path`.
    fn read_record(&self, path: &Path) -> Result<Option<PositionRecord>, StorageError>;

    /// Replace the record at `path`.
    fn write_record(&mut self, path: &Path, record: &PositionRecord) -> Result<(), StorageError>;

    /// Remove the record at `path`.
    fn delete(&mut self, path: &Path) -> Result<(), StorageError>;
}
