//! Blinds Common Library
//!
//! This crate provides shared types, constants and configuration loading
//! utilities for the blinds stepper workspace.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`consts`] - Workspace-wide constants and default paths
//! - [`motor`] - Motor configuration, coil driver trait, position types
//! - [`storage`] - Byte store interface for the persisted position record
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use blinds_common::prelude::*;
//!
//! let state = PositionState::UNINITIALIZED;
//! assert!(!state.is_initialized());
//! ```

pub mod config;
pub mod consts;
pub mod motor;
pub mod prelude;
pub mod storage;
