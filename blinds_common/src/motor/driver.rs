//! Coil driver trait and error types.
//!
//! This module defines:
//! - `CoilDriver` trait - Interface for pluggable digital output backends
//! - `HalError` enum - Error types for driver operations
//! - `DriverFactory` type alias - Factory function type

use crate::motor::config::MotorConfig;
use crate::motor::types::CoilPattern;
use thiserror::Error;

/// Error types for coil driver operations.
#[derive(Debug, Clone, Error)]
pub enum HalError {
    /// Driver initialization failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Output line write failed
    #[error("Hardware communication error: {0}")]
    CommunicationError(String),

    /// Driver not found
    #[error("Driver not found: {0}")]
    DriverNotFound(String),
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn CoilDriver>;

/// Trait defining the digital output interface for the four coil lines.
///
/// # Lifecycle
///
/// 1. `init()` - Called once at startup; failure is fatal
/// 2. `set_lines()` - Called once per tick while a move runs
/// 3. `shutdown()` - Called when the engine stops
///
/// A driver is owned by exactly one context at a time. During a timer-driven
/// move it is handed to the timer thread and returned with the completion
/// signal, so implementations need `Send` but never `Sync`.
pub trait CoilDriver: Send {
    /// Returns the driver's unique identifier (e.g., "simulation", "sysfs").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Configure the output lines.
    ///
    /// # Errors
    /// Return `HalError::InitFailed` if the lines cannot be claimed.
    fn init(&mut self, config: &MotorConfig) -> Result<(), HalError>;

    /// Drive the four coil lines to the given pattern.
    ///
    /// Bit 3 maps to coil 1 and bit 0 to coil 4.
    fn set_lines(&mut self, pattern: CoilPattern) -> Result<(), HalError>;

    /// De-energize and release the lines.
    fn shutdown(&mut self) -> Result<(), HalError> {
        self.set_lines(CoilPattern::empty())
    }
}
