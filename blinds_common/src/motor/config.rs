//! Motor and storage configuration.
//!
//! This module contains the configuration loaded from `blinds.toml`:
//! - `BlindsConfig` - Top-level file layout
//! - `MotorConfig` - Step rate, coil pins, driver and stepping strategy
//! - `StorageConfig` - Location of the persisted position record

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    COIL_LINES, DEFAULT_PINS, DEFAULT_RPM, DEFAULT_STATE_FILE, DEFAULT_STEPS_PER_REVOLUTION,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

fn default_steps_per_revolution() -> u32 {
    DEFAULT_STEPS_PER_REVOLUTION
}

fn default_rpm() -> u32 {
    DEFAULT_RPM
}

fn default_pins() -> [u32; COIL_LINES] {
    DEFAULT_PINS
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_state_file() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_FILE)
}

/// How the phase sequence is clocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SteppingMode {
    /// A dedicated timer context emits ticks; the worker only waits for completion.
    #[default]
    Timer,
    /// The worker sleeps between ticks itself.
    Blocking,
}

/// Top-level configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "blinds-01"
///
/// [motor]
/// steps_per_revolution = 2048
/// rpm = 10
/// stepping = "timer"
/// driver = "simulation"
/// pins = [26, 27, 14, 12]
///
/// [storage]
/// state_file = "/var/lib/blinds/state.bin"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlindsConfig {
    /// Common fields (log level, service name).
    pub shared: SharedConfig,

    /// Motor section; defaults apply when omitted.
    #[serde(default)]
    pub motor: MotorConfig,

    /// Storage section; defaults apply when omitted.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl BlindsConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;
        self.motor.validate()?;
        self.storage.validate()
    }
}

/// Stepper motor parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MotorConfig {
    /// Coil transitions per full output revolution.
    #[serde(default = "default_steps_per_revolution")]
    pub steps_per_revolution: u32,

    /// Constant rotational speed. No ramping is applied.
    #[serde(default = "default_rpm")]
    pub rpm: u32,

    /// Stepping strategy.
    #[serde(default)]
    pub stepping: SteppingMode,

    /// Coil driver name as registered in the driver registry.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Output line numbers for coils 1..4.
    #[serde(default = "default_pins")]
    pub pins: [u32; COIL_LINES],
}

impl MotorConfig {
    /// Validate the motor configuration.
    ///
    /// # Validation Rules
    /// 1. `steps_per_revolution` > 0
    /// 2. `rpm` > 0
    /// 3. `driver` is not empty
    /// 4. All pins distinct
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps_per_revolution == 0 {
            return Err(ConfigError::ValidationError(
                "steps_per_revolution must be greater than 0".to_string(),
            ));
        }
        if self.rpm == 0 {
            return Err(ConfigError::ValidationError(
                "rpm must be greater than 0".to_string(),
            ));
        }
        if self.driver.is_empty() {
            return Err(ConfigError::ValidationError(
                "driver cannot be empty".to_string(),
            ));
        }

        let mut seen = std::collections::HashSet::new();
        for pin in &self.pins {
            if !seen.insert(pin) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate coil pin: {}",
                    pin
                )));
            }
        }
        Ok(())
    }
}

impl Default for MotorConfig {
    fn default() -> Self {
        Self {
            steps_per_revolution: DEFAULT_STEPS_PER_REVOLUTION,
            rpm: DEFAULT_RPM,
            stepping: SteppingMode::default(),
            driver: default_driver(),
            pins: DEFAULT_PINS,
        }
    }
}

/// Persistence parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path of the 4-byte position record.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
}

impl StorageConfig {
    /// Validate the storage configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.state_file.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError(
                "state_file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
        }
    }
}
