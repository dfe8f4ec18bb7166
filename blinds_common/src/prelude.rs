//! Prelude module for common re-exports.
//!
//! ```rust
//! use blinds_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::motor::config::{BlindsConfig, MotorConfig, SteppingMode, StorageConfig};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::motor::driver::{CoilDriver, DriverFactory, HalError};
pub use crate::motor::types::{CoilPattern, PHASE_TABLE};

// ─── Position ───────────────────────────────────────────────────────
pub use crate::motor::types::{PositionRecord, PositionState};
pub use crate::storage::{ByteStore, StorageError};
