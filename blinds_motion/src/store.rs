//! Byte store implementations.
//!
//! - [`FsStore`] - Plain files, synced to the device after every write
//! - [`MemoryStore`] - Shared in-memory map with fault injection for tests

use blinds_common::motor::types::PositionRecord;
use blinds_common::storage::{ByteStore, StorageError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

fn decode(path: &Path, bytes: &[u8]) -> Result<PositionRecord, StorageError> {
    PositionRecord::decode(bytes).ok_or_else(|| StorageError::Corrupt {
        path: path.to_path_buf(),
        len: bytes.len(),
    })
}

fn encode(record: &PositionRecord) -> Result<Vec<u8>, StorageError> {
    record
        .encode()
        .map_err(|e| StorageError::Encode(e.to_string()))
}

/// Filesystem-backed byte store.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    /// Create a filesystem store.
    pub fn new() -> Self {
        Self
    }
}

impl ByteStore for FsStore {
    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        path.try_exists().map_err(|e| StorageError::io(path, e))
    }

    fn create_empty(&mut self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        file.sync_all().map_err(|e| StorageError::io(path, e))?;
        debug!("Created empty record {:?}", path);
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Option<PositionRecord>, StorageError> {
        match fs::read(path) {
            Ok(bytes) => decode(path, &bytes).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }

    fn write_record(&mut self, path: &Path, record: &PositionRecord) -> Result<(), StorageError> {
        let bytes = encode(record)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
        }
        let mut file = File::create(path).map_err(|e| StorageError::io(path, e))?;
        file.write_all(&bytes)
            .and_then(|()| file.sync_all())
            .map_err(|e| StorageError::io(path, e))?;
        debug!("Wrote record {:?} to {:?}", record, path);
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), StorageError> {
        match fs::remove_file(path) {
            Ok(()) => {
                debug!("Deleted record {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    files: HashMap<PathBuf, Vec<u8>>,
    fail_reads: bool,
    fail_writes: bool,
    fail_deletes: bool,
}

/// In-memory byte store. Clones share the same contents.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw bytes stored at `path`.
    pub fn raw(&self, path: &Path) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).cloned()
    }

    /// Place raw bytes at `path`, bypassing the record codec.
    pub fn insert_raw(&self, path: &Path, bytes: Vec<u8>) {
        self.inner.lock().files.insert(path.to_path_buf(), bytes);
    }

    /// Make reads fail.
    pub fn set_fail_reads(&self, fail: bool) {
        self.inner.lock().fail_reads = fail;
    }

    /// Make `write_record` and `create_empty` fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Make `delete` fail.
    pub fn set_fail_deletes(&self, fail: bool) {
        self.inner.lock().fail_deletes = fail;
    }
}

impl ByteStore for MemoryStore {
    fn exists(&self, path: &Path) -> Result<bool, StorageError> {
        Ok(self.inner.lock().files.contains_key(path))
    }

    fn create_empty(&mut self, path: &Path) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(StorageError::Injected(format!("create {:?}", path)));
        }
        inner.files.insert(path.to_path_buf(), Vec::new());
        Ok(())
    }

    fn read_record(&self, path: &Path) -> Result<Option<PositionRecord>, StorageError> {
        let inner = self.inner.lock();
        if inner.fail_reads {
            return Err(StorageError::Injected(format!("read {:?}", path)));
        }
        match inner.files.get(path) {
            Some(bytes) => decode(path, bytes).map(Some),
            None => Ok(None),
        }
    }

    fn write_record(&mut self, path: &Path, record: &PositionRecord) -> Result<(), StorageError> {
        let bytes = encode(record)?;
        let mut inner = self.inner.lock();
        if inner.fail_writes {
            return Err(StorageError::Injected(format!("write {:?}", path)));
        }
        inner.files.insert(path.to_path_buf(), bytes);
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        if inner.fail_deletes {
            return Err(StorageError::Injected(format!("delete {:?}", path)));
        }
        inner.files.remove(path);
        Ok(())
    }
}
