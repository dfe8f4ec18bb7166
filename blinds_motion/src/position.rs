//! Position store.
//!
//! Holds the authoritative [`PositionState`] and persists it through a
//! [`ByteStore`] with a delete-before / write-after protocol:
//!
//! 1. `begin_move` deletes the record before any coil is energized.
//! 2. `apply_move` updates memory once the move has finished.
//! 3. `persist` writes the full record back.
//!
//! A power loss between 1 and 3 leaves no record on disk, so the next
//! startup falls back to an unknown position instead of trusting a stale one.

use blinds_common::motor::types::{PositionRecord, PositionState};
use blinds_common::storage::{ByteStore, StorageError};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// In-memory position plus its persisted record.
pub struct PositionStore {
    store: Box<dyn ByteStore>,
    path: PathBuf,
    state: PositionState,
}

impl PositionStore {
    /// Load the position from `path`.
    ///
    /// - No record: an empty one is created and the position is unknown.
    /// - Empty, short or inconsistent record: the position is unknown.
    ///
    /// # Errors
    /// Any other storage failure.
    pub fn open<P: Into<PathBuf>>(
        mut store: Box<dyn ByteStore>,
        path: P,
    ) -> Result<Self, StorageError> {
        let path = path.into();

        let state = if !store.exists(&path)? {
            store.create_empty(&path)?;
            info!("No position record at {:?}, created empty record", path);
            PositionState::UNINITIALIZED
        } else {
            match store.read_record(&path) {
                Ok(Some(record)) => {
                    let state = PositionState::from(record);
                    if state.is_consistent() {
                        info!(
                            "Loaded position max_steps={} current_step={}",
                            state.max_steps, state.current_step
                        );
                        state
                    } else {
                        warn!(
                            "Unexpected position record: max_steps={}, current_step={}; position unknown",
                            state.max_steps, state.current_step
                        );
                        PositionState::UNINITIALIZED
                    }
                }
                Ok(None) => {
                    warn!("Position record {:?} vanished during load", path);
                    PositionState::UNINITIALIZED
                }
                Err(StorageError::Corrupt { len, .. }) => {
                    warn!(
                        "Position record {:?} holds {} bytes; position unknown",
                        path, len
                    );
                    PositionState::UNINITIALIZED
                }
                Err(e) => return Err(e),
            }
        };

        Ok(Self { store, path, state })
    }

    /// Current in-memory position.
    pub fn state(&self) -> PositionState {
        self.state
    }

    /// Record location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the record ahead of physical motion.
    pub fn begin_move(&mut self) -> Result<(), StorageError> {
        self.store.delete(&self.path)?;
        debug!("Position record cleared for move");
        Ok(())
    }

    /// Apply a finished move of `steps` to the in-memory position.
    pub fn apply_move(&mut self, steps: i32) -> PositionState {
        if !self.state.is_initialized() {
            info!("Initialize position window");
        }
        self.state = self.state.after_move(steps);
        self.state
    }

    /// Write the in-memory position to the record.
    pub fn persist(&mut self) -> Result<(), StorageError> {
        self.store
            .write_record(&self.path, &PositionRecord::from(self.state))
    }

    /// Forget the position and persist `(-1, -1)` immediately.
    pub fn reset(&mut self) -> Result<(), StorageError> {
        self.state = PositionState::UNINITIALIZED;
        self.persist()?;
        info!("Position reset");
        Ok(())
    }
}
