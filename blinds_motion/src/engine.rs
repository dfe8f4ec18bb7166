//! Motion engine.
//!
//! The `MotionEngine` owns the admission gate and a single long-lived worker
//! thread. The worker is the only context that drives the coil lines,
//! mutates the position or touches the position record.
//!
//! ```text
//!  command context            worker context              timer context
//!  ───────────────            ──────────────              ─────────────
//!  submit(steps)
//!   try_acquire ──Busy──► return
//!   │Acquired
//!   └─ Move{steps, permit} ──► delete record
//!                              run sequencer ──job──────► tick, set_lines
//!                                            ◄──done───── (driver, ticks)
//!                              de-energize
//!                              update position, publish
//!                              write record
//!                              drop permit (gate free)
//! ```

use blinds_common::motor::config::BlindsConfig;
use blinds_common::motor::driver::{CoilDriver, HalError};
use blinds_common::motor::types::PositionState;
use blinds_common::storage::{ByteStore, StorageError};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::driver_registry::DriverRegistry;
use crate::error::MotionError;
use crate::gate::{AdmissionGate, AdmissionPermit, GateResult};
use crate::position::PositionStore;
use crate::sequencer::PhaseSequencer;

/// Outcome of an admission attempt.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveAdmission {
    /// The request was admitted and handed to the worker.
    Accepted,
    /// A move is in flight; nothing was changed.
    Busy,
}

/// Outcome of a reset request.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetAck {
    /// Position forgotten and `(-1, -1)` persisted.
    Done,
    /// A move is in flight; nothing was changed.
    Busy,
}

/// How the most recent move ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Motion finished and the new position was persisted.
    Completed {
        /// Requested steps
        steps: i32,
        /// Ticks emitted
        ticks: u32,
        /// Position after the move
        state: PositionState,
    },
    /// Motion or persistence failed. Motion already performed is not undone.
    Failed {
        /// Requested steps
        steps: i32,
        /// Ticks emitted before the failure
        ticks: u32,
        /// In-memory position after the failure
        state: PositionState,
        /// What went wrong
        reason: String,
    },
}

impl MoveOutcome {
    /// True for [`MoveOutcome::Completed`].
    pub fn is_completed(&self) -> bool {
        matches!(self, MoveOutcome::Completed { .. })
    }
}

enum WorkerCommand {
    Move {
        steps: i32,
        permit: AdmissionPermit,
    },
    Reset {
        permit: AdmissionPermit,
        reply: SyncSender<Result<(), StorageError>>,
    },
}

/// State the worker publishes for the command context.
struct Shared {
    position: RwLock<PositionState>,
    last_outcome: RwLock<Option<MoveOutcome>>,
}

/// Serializes moves, drives the coils and keeps the position record.
pub struct MotionEngine {
    gate: AdmissionGate,
    shared: Arc<Shared>,
    interval: Duration,
    commands: Option<SyncSender<WorkerCommand>>,
    worker: Option<JoinHandle<()>>,
}

impl MotionEngine {
    /// Start the worker thread.
    ///
    /// # Errors
    /// `MotionError::HardwareInit` if the worker thread cannot be spawned.
    pub fn start(
        sequencer: PhaseSequencer,
        driver: Box<dyn CoilDriver>,
        positions: PositionStore,
    ) -> Result<Self, MotionError> {
        let shared = Arc::new(Shared {
            position: RwLock::new(positions.state()),
            last_outcome: RwLock::new(None),
        });
        let interval = sequencer.interval();
        let (commands, rx) = mpsc::sync_channel(1);

        let worker = Worker {
            sequencer,
            driver: Some(driver),
            positions,
            shared: Arc::clone(&shared),
        };
        let handle = thread::Builder::new()
            .name("stepper-worker".to_string())
            .spawn(move || worker.run(rx))
            .map_err(|e| HalError::InitFailed(format!("Failed to start stepper worker: {}", e)))?;

        info!(
            "Motion engine started (interval={}us)",
            interval.as_micros()
        );
        Ok(Self {
            gate: AdmissionGate::new(),
            shared,
            interval,
            commands: Some(commands),
            worker: Some(handle),
        })
    }

    /// Build the driver, sequencer and position store from configuration
    /// and start the engine.
    ///
    /// # Errors
    /// - `HardwareInit` for driver or timer setup failures
    /// - `Storage` if the position record cannot be loaded
    pub fn from_config(
        config: &BlindsConfig,
        registry: &DriverRegistry,
        store: Box<dyn ByteStore>,
    ) -> Result<Self, MotionError> {
        config.validate()?;
        let driver = registry.create_initialized(&config.motor)?;
        let sequencer = PhaseSequencer::new(&config.motor)?;
        let positions = PositionStore::open(store, config.storage.state_file.clone())?;
        Self::start(sequencer, driver, positions)
    }

    /// Admit a move of `steps` without waiting for it to run.
    ///
    /// # Errors
    /// `WorkerStopped` if the worker has exited; the gate is released.
    pub fn submit(&self, steps: i32) -> Result<MoveAdmission, MotionError> {
        let GateResult::Acquired(permit) = self.gate.try_acquire() else {
            debug!("Move of {} steps rejected: stepper is still moving", steps);
            return Ok(MoveAdmission::Busy);
        };
        self.dispatch(WorkerCommand::Move { steps, permit })?;
        info!("Move of {} steps accepted", steps);
        Ok(MoveAdmission::Accepted)
    }

    /// Admit a move to `fraction` of the known range.
    ///
    /// # Errors
    /// - `Validation` if `fraction` is outside `[0, 1]`; the gate is untouched
    /// - `Uninitialized` if the position is unknown; the gate is released
    pub fn move_to_fraction(&self, fraction: f64) -> Result<MoveAdmission, MotionError> {
        if !(0.0..=1.0).contains(&fraction) {
            warn!("Fraction out of [0, 1] range. Got: {:.3}", fraction);
            return Err(MotionError::Validation(format!(
                "fraction {} outside [0, 1]",
                fraction
            )));
        }

        let GateResult::Acquired(permit) = self.gate.try_acquire() else {
            return Ok(MoveAdmission::Busy);
        };

        // Worker is idle while we hold the permit, so this read is stable.
        let state = self.status();
        if !state.is_initialized() {
            warn!("Move to fraction {:.3} refused: state uninitialized", fraction);
            return Err(MotionError::Uninitialized);
        }

        let target = (fraction * f64::from(state.max_steps)) as i32;
        let steps = target - i32::from(state.current_step);
        self.dispatch(WorkerCommand::Move { steps, permit })?;
        info!(
            "Move to fraction {:.3} accepted: target={}, steps={}",
            fraction, target, steps
        );
        Ok(MoveAdmission::Accepted)
    }

    /// Consistent snapshot of the position.
    pub fn status(&self) -> PositionState {
        *self.shared.position.read()
    }

    /// Forget the position and persist `(-1, -1)`.
    ///
    /// Returns `Busy` without change while a move is in flight.
    ///
    /// # Errors
    /// `Storage` if the record cannot be written; the in-memory position is
    /// still reset.
    pub fn reset(&self) -> Result<ResetAck, MotionError> {
        let GateResult::Acquired(permit) = self.gate.try_acquire() else {
            return Ok(ResetAck::Busy);
        };
        let (reply, done) = mpsc::sync_channel(1);
        self.dispatch(WorkerCommand::Reset { permit, reply })?;
        done.recv().map_err(|_| MotionError::WorkerStopped)??;
        Ok(ResetAck::Done)
    }

    /// Result of the most recent move, if any.
    pub fn last_outcome(&self) -> Option<MoveOutcome> {
        self.shared.last_outcome.read().clone()
    }

    /// Whether the gate is held.
    pub fn is_moving(&self) -> bool {
        self.gate.is_held()
    }

    /// Wait until no move is in flight. Returns `false` on timeout.
    pub fn wait_idle(&self, timeout: Duration) -> bool {
        self.gate.wait_free(timeout)
    }

    /// Time between ticks.
    pub fn step_interval(&self) -> Duration {
        self.interval
    }

    /// Stop the worker after any in-flight move and join it.
    pub fn shutdown(&mut self) {
        if self.commands.take().is_none() {
            return;
        }
        info!("Motion engine shutting down");
        if let Some(handle) = self.worker.take() {
            if handle.join().is_err() {
                error!("Stepper worker panicked");
            }
        }
    }

    fn dispatch(&self, command: WorkerCommand) -> Result<(), MotionError> {
        let commands = self.commands.as_ref().ok_or(MotionError::WorkerStopped)?;
        // Dropping the rejected command drops its permit and frees the gate.
        commands.send(command).map_err(|_| {
            error!("Stepper worker is not running");
            MotionError::WorkerStopped
        })
    }
}

impl Drop for MotionEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    sequencer: PhaseSequencer,
    driver: Option<Box<dyn CoilDriver>>,
    positions: PositionStore,
    shared: Arc<Shared>,
}

impl Worker {
    fn run(mut self, commands: Receiver<WorkerCommand>) {
        debug!("Stepper worker waiting for moves");
        for command in commands {
            match command {
                WorkerCommand::Move { steps, permit } => {
                    let outcome = self.execute_move(steps);
                    *self.shared.last_outcome.write() = Some(outcome);
                    drop(permit);
                }
                WorkerCommand::Reset { permit, reply } => {
                    let result = self.positions.reset();
                    if let Err(e) = &result {
                        error!("Failed to persist reset: {}", e);
                    }
                    self.publish();
                    drop(permit);
                    let _ = reply.send(result);
                }
            }
        }

        if let Some(driver) = self.driver.as_mut() {
            if let Err(e) = driver.shutdown() {
                warn!("Driver shutdown failed: {}", e);
            }
        }
        debug!("Stepper worker stopped");
    }

    fn publish(&self) {
        *self.shared.position.write() = self.positions.state();
    }

    fn execute_move(&mut self, steps: i32) -> MoveOutcome {
        let before = self.positions.state();

        let Some(driver) = self.driver.take() else {
            error!("Move of {} steps refused: coil driver unavailable", steps);
            return MoveOutcome::Failed {
                steps,
                ticks: 0,
                state: before,
                reason: "coil driver unavailable".to_string(),
            };
        };

        // Delete state first so an interrupted move leaves no stale record.
        if let Err(e) = self.positions.begin_move() {
            error!("Move of {} steps refused: {}", steps, e);
            self.driver = Some(driver);
            return MoveOutcome::Failed {
                steps,
                ticks: 0,
                state: before,
                reason: format!("failed to clear position record: {}", e),
            };
        }

        let stepped = self.sequencer.execute(steps, driver);
        self.driver = stepped.driver;
        let report = stepped.report;

        if report.error.is_none() || report.ticks > 0 {
            self.positions.apply_move(report.traveled);
        }
        self.publish();
        let state = self.positions.state();
        let persisted = self.positions.persist();

        let mut reasons = Vec::new();
        if let Some(e) = &report.error {
            reasons.push(format!("output failure after {} ticks: {}", report.ticks, e));
        }
        if let Err(e) = &persisted {
            reasons.push(format!("failed to persist position: {}", e));
        }

        if reasons.is_empty() {
            info!(
                "Move complete: steps={}, ticks={}, elapsed={:?}, max_steps={}, current_step={}",
                steps, report.ticks, report.elapsed, state.max_steps, state.current_step
            );
            MoveOutcome::Completed {
                steps,
                ticks: report.ticks,
                state,
            }
        } else {
            let reason = reasons.join("; ");
            error!("Move of {} steps failed: {}", steps, reason);
            MoveOutcome::Failed {
                steps,
                ticks: report.ticks,
                state,
                reason,
            }
        }
    }
}
