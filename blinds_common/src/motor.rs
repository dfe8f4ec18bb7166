//! Motor configuration, coil driver interface and position types.
//!
//! This module contains the types shared between the motion engine and
//! anything that drives or observes it.

pub mod config;
pub mod driver;
pub mod types;
