//! Linux sysfs GPIO coil driver.
//!
//! Exports the four configured pins under `/sys/class/gpio`, sets them as
//! outputs and keeps the `value` files open for the lifetime of the driver.

use blinds_common::consts::COIL_LINES;
use blinds_common::motor::config::MotorConfig;
use blinds_common::motor::driver::{CoilDriver, HalError};
use blinds_common::motor::types::CoilPattern;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Default sysfs GPIO root.
pub const SYSFS_GPIO_ROOT: &str = "/sys/class/gpio";

struct Line {
    pin: u32,
    value: File,
    exported_by_us: bool,
}

/// Coil driver backed by sysfs GPIO.
pub struct SysfsCoils {
    root: PathBuf,
    lines: Vec<Line>,
}

impl SysfsCoils {
    /// Driver rooted at `/sys/class/gpio`.
    pub fn new() -> Self {
        Self::with_root(SYSFS_GPIO_ROOT)
    }

    /// Driver rooted at an alternative directory.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            lines: Vec::with_capacity(COIL_LINES),
        }
    }

    fn claim(&self, pin: u32) -> Result<Line, HalError> {
        let pin_dir = self.root.join(format!("gpio{}", pin));
        let mut exported_by_us = false;
        if !pin_dir.exists() {
            fs::write(self.root.join("export"), pin.to_string()).map_err(|e| {
                HalError::InitFailed(format!("Failed to export gpio {}: {}", pin, e))
            })?;
            exported_by_us = true;
        }

        let configured = fs::write(pin_dir.join("direction"), "out")
            .map_err(|e| {
                HalError::InitFailed(format!("Failed to set gpio {} as output: {}", pin, e))
            })
            .and_then(|()| {
                OpenOptions::new()
                    .write(true)
                    .open(pin_dir.join("value"))
                    .map_err(|e| {
                        HalError::InitFailed(format!("Failed to open gpio {} value: {}", pin, e))
                    })
            });

        match configured {
            Ok(value) => {
                debug!("Claimed gpio {} (exported_by_us={})", pin, exported_by_us);
                Ok(Line {
                    pin,
                    value,
                    exported_by_us,
                })
            }
            Err(e) => {
                if exported_by_us {
                    self.unexport(pin);
                }
                Err(e)
            }
        }
    }

    fn unexport(&self, pin: u32) {
        match fs::write(self.root.join("unexport"), pin.to_string()) {
            Ok(()) => debug!("Unexported gpio {}", pin),
            Err(e) => warn!("Failed to unexport gpio {}: {}", pin, e),
        }
    }

    /// Hand back every line this driver exported.
    fn release(&self, lines: Vec<Line>) {
        for line in lines {
            if line.exported_by_us {
                self.unexport(line.pin);
            }
        }
    }
}

impl Default for SysfsCoils {
    fn default() -> Self {
        Self::new()
    }
}

impl CoilDriver for SysfsCoils {
    fn name(&self) -> &'static str {
        "sysfs"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &MotorConfig) -> Result<(), HalError> {
        for (i, pin) in config.pins.iter().enumerate() {
            if config.pins[..i].contains(pin) {
                return Err(HalError::ConfigError(format!(
                    "gpio {} assigned to more than one coil",
                    pin
                )));
            }
        }

        info!("Claiming gpio pins {:?} under {:?}", config.pins, self.root);
        let mut lines = Vec::with_capacity(COIL_LINES);
        for pin in config.pins {
            match self.claim(pin) {
                Ok(line) => lines.push(line),
                Err(e) => {
                    self.release(lines);
                    return Err(e);
                }
            }
        }
        self.lines = lines;
        self.set_lines(CoilPattern::empty())
    }

    fn set_lines(&mut self, pattern: CoilPattern) -> Result<(), HalError> {
        if self.lines.len() != COIL_LINES {
            return Err(HalError::CommunicationError(
                "sysfs driver not initialized".to_string(),
            ));
        }
        for (line, level) in self.lines.iter_mut().zip(pattern.levels()) {
            let byte: &[u8] = if level { b"1" } else { b"0" };
            line.value
                .seek(SeekFrom::Start(0))
                .and_then(|_| line.value.write_all(byte))
                .map_err(|e| {
                    HalError::CommunicationError(format!(
                        "Failed to write gpio {}: {}",
                        line.pin, e
                    ))
                })?;
        }
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), HalError> {
        let result = self.set_lines(CoilPattern::empty());
        let lines = std::mem::take(&mut self.lines);
        self.release(lines);
        result
    }
}
