//! # Blinds Motion Library
//!
//! Stepper motion engine for a window-blind actuator with crash-safe
//! position persistence.
//!
//! # Module Structure
//!
//! - [`engine`] - MotionEngine and its worker context
//! - [`gate`] - Admission gate, one move in flight
//! - [`sequencer`] - Step timing and coil phase sequencing
//! - [`position`] - Position state and the delete-before / write-after protocol
//! - [`store`] - Filesystem and in-memory byte stores
//! - [`driver_registry`] - Coil driver factory registration
//! - [`drivers`] - Coil driver implementations
//! - [`gateway`] - JSON-lines command gateway
//! - [`error`] - Engine error type
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                     blinds_motion                             │
//! │  ┌───────────┐    ┌──────────────┐    ┌────────────────────┐  │
//! │  │  Gateway  │───►│ MotionEngine │◄──►│  Driver Registry   │  │
//! │  │ (stdin)   │    │  (worker)    │    │                    │  │
//! │  └───────────┘    └──┬────────┬──┘    └────────────────────┘  │
//! │                      │        │                               │
//! │                      ▼        ▼                               │
//! │           ┌──────────────┐ ┌───────────────┐                  │
//! │           │PhaseSequencer│ │ PositionStore │                  │
//! │           │ (step-timer) │ │  (ByteStore)  │                  │
//! │           └──────┬───────┘ └───────────────┘                  │
//! │                  ▼                                            │
//! │           ┌──────────────┐                                    │
//! │           │  CoilDriver  │ (trait object)                     │
//! │           └──────────────┘                                    │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod driver_registry;
pub mod drivers;
pub mod engine;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod position;
pub mod sequencer;
pub mod store;

// Re-export key types for convenience
pub use crate::driver_registry::DriverRegistry;
pub use crate::engine::{MotionEngine, MoveAdmission, MoveOutcome, ResetAck};
pub use crate::error::MotionError;
pub use crate::position::PositionStore;
pub use crate::sequencer::PhaseSequencer;
pub use crate::store::{FsStore, MemoryStore};
