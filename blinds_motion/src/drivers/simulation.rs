//! Simulation coil driver.
//!
//! Records every pattern written to the lines instead of driving hardware.
//! A [`CoilProbe`] handle observes the recorded state from another thread,
//! which is how tests check what the engine did to the outputs.

use blinds_common::motor::config::MotorConfig;
use blinds_common::motor::driver::{CoilDriver, HalError};
use blinds_common::motor::types::CoilPattern;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{info, trace};

#[derive(Debug)]
struct CoilLog {
    lines: CoilPattern,
    history: Vec<CoilPattern>,
    ticks: u64,
}

impl Default for CoilLog {
    fn default() -> Self {
        Self {
            lines: CoilPattern::empty(),
            history: Vec::new(),
            ticks: 0,
        }
    }
}

/// Read-only view of a [`SimulatedCoils`] instance.
#[derive(Clone)]
pub struct CoilProbe {
    log: Arc<Mutex<CoilLog>>,
}

impl CoilProbe {
    /// Current line levels.
    pub fn lines(&self) -> CoilPattern {
        self.log.lock().lines
    }

    /// Every pattern written, including de-energize writes.
    pub fn history(&self) -> Vec<CoilPattern> {
        self.log.lock().history.clone()
    }

    /// Number of energizing writes (phase ticks).
    pub fn tick_count(&self) -> u64 {
        self.log.lock().ticks
    }
}

/// Software stand-in for four GPIO lines.
pub struct SimulatedCoils {
    log: Arc<Mutex<CoilLog>>,
    writes: usize,
    fail_after: Option<usize>,
}

impl SimulatedCoils {
    /// Create a driver with all lines low.
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(CoilLog::default())),
            writes: 0,
            fail_after: None,
        }
    }

    /// Make every write after the first `writes` fail.
    pub fn fail_after(mut self, writes: usize) -> Self {
        self.fail_after = Some(writes);
        self
    }

    /// Handle for observing the lines.
    pub fn probe(&self) -> CoilProbe {
        CoilProbe {
            log: Arc::clone(&self.log),
        }
    }
}

impl Default for SimulatedCoils {
    fn default() -> Self {
        Self::new()
    }
}

impl CoilDriver for SimulatedCoils {
    fn name(&self) -> &'static str {
        "simulation"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, config: &MotorConfig) -> Result<(), HalError> {
        info!("Simulated coils on pins {:?}", config.pins);
        self.set_lines(CoilPattern::empty())
    }

    fn set_lines(&mut self, pattern: CoilPattern) -> Result<(), HalError> {
        if self.fail_after.is_some_and(|limit| self.writes >= limit) {
            return Err(HalError::CommunicationError(format!(
                "simulated output fault after {} writes",
                self.writes
            )));
        }
        self.writes += 1;

        let mut log = self.log.lock();
        log.lines = pattern;
        log.history.push(pattern);
        if !pattern.is_empty() {
            log.ticks += 1;
        }
        trace!("Simulated lines {:?}", pattern.levels());
        Ok(())
    }
}
