//! Motion engine error types.

use blinds_common::config::ConfigError;
use blinds_common::motor::driver::HalError;
use blinds_common::storage::StorageError;
use thiserror::Error;

/// Errors returned by [`crate::engine::MotionEngine`] operations.
///
/// A busy gate is not an error; it is reported as
/// [`crate::engine::MoveAdmission::Busy`].
#[derive(Debug, Error)]
pub enum MotionError {
    /// Output lines or timer could not be set up. Fatal at startup.
    #[error("Hardware initialization failed: {0}")]
    HardwareInit(#[from] HalError),

    /// Position record could not be read, written or deleted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed or out-of-range request, rejected before admission.
    #[error("Invalid request: {0}")]
    Validation(String),

    /// The request needs a known position.
    #[error("State uninitialized")]
    Uninitialized,

    /// The worker context has exited.
    #[error("Motion worker is not running")]
    WorkerStopped,
}
