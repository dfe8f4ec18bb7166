//! Phase sequencer.
//!
//! Turns a signed step count into timed coil patterns. Two strategies:
//!
//! - [`SteppingMode::Timer`]: a long-lived timer thread owns the coil driver
//!   for the duration of a move, emits one pattern per interval, then hands
//!   the driver back over a one-shot completion channel. The timer thread
//!   only touches the step index and the output lines.
//! - [`SteppingMode::Blocking`]: the calling thread sleeps between ticks.
//!
//! Both strategies de-energize the coils in the calling context once the
//! last tick has been held for one interval.

use blinds_common::consts::MICROS_PER_MINUTE;
use blinds_common::motor::config::{MotorConfig, SteppingMode};
use blinds_common::motor::driver::{CoilDriver, HalError};
use blinds_common::motor::types::{CoilPattern, PHASE_TABLE};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, trace, warn};

/// Time between ticks for the given step rate, rounded up to whole microseconds.
///
/// The rounding means the actual speed can be slightly below `rpm`.
pub fn step_interval(steps_per_revolution: u32, rpm: u32) -> Duration {
    let steps_per_minute = (u64::from(steps_per_revolution) * u64::from(rpm)).max(1);
    Duration::from_micros(MICROS_PER_MINUTE.div_ceil(steps_per_minute))
}

/// One move's step index walk.
///
/// Positive moves walk the index `0 → magnitude`, negative moves walk
/// `magnitude → 0`; each tick emits `PHASE_TABLE[index % 4]` before advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseRun {
    direction: i8,
    position: u32,
    end: u32,
    interval: Duration,
}

impl PhaseRun {
    /// Plan a run of `steps` ticks at `interval`.
    pub fn new(steps: i32, interval: Duration) -> Self {
        let magnitude = steps.unsigned_abs();
        let (direction, position, end) = match steps.signum() {
            1 => (1, 0, magnitude),
            -1 => (-1, magnitude, 0),
            _ => (0, 0, 0),
        };
        Self {
            direction,
            position,
            end,
            interval,
        }
    }

    /// `1`, `-1`, or `0` for no motion.
    pub fn direction(&self) -> i8 {
        self.direction
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks left to emit.
    pub fn remaining(&self) -> u32 {
        self.position.abs_diff(self.end)
    }

    /// True once the index has reached its target.
    pub fn is_complete(&self) -> bool {
        self.position == self.end
    }

    /// Emit the pattern for the current index and advance it.
    pub fn tick(&mut self) -> Option<CoilPattern> {
        if self.is_complete() {
            return None;
        }
        let pattern = PHASE_TABLE[(self.position % 4) as usize];
        self.position = if self.direction > 0 {
            self.position + 1
        } else {
            self.position - 1
        };
        Some(pattern)
    }
}

impl Iterator for PhaseRun {
    type Item = CoilPattern;

    fn next(&mut self) -> Option<CoilPattern> {
        self.tick()
    }
}

/// What happened while stepping.
#[derive(Debug, Clone)]
pub struct StepReport {
    /// Patterns actually written to the lines.
    pub ticks: u32,
    /// Signed distance covered: `direction × ticks`.
    pub traveled: i32,
    /// Wall time from start to completion signal.
    pub elapsed: Duration,
    /// Output failure that stopped the run early, if any.
    pub error: Option<HalError>,
}

/// Result of [`PhaseSequencer::execute`].
pub struct Stepped {
    /// The driver handed back for the next move; `None` if it was lost with
    /// a crashed timer thread.
    pub driver: Option<Box<dyn CoilDriver>>,
    /// Tick accounting.
    pub report: StepReport,
}

/// Drive `run` to completion on the current thread.
///
/// The first tick fires one interval after entry and completion is detected
/// one interval after the last tick. Deadlines are absolute so sleep jitter
/// does not accumulate.
fn drive(run: &mut PhaseRun, driver: &mut dyn CoilDriver) -> (u32, Option<HalError>) {
    let mut ticks = 0;
    let mut next = Instant::now();
    loop {
        next += run.interval();
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }

        let Some(pattern) = run.tick() else {
            return (ticks, None);
        };
        if let Err(e) = driver.set_lines(pattern) {
            return (ticks, Some(e));
        }
        ticks += 1;
        trace!("tick {} pattern {:04b}", ticks, pattern.bits());
    }
}

struct TimerJob {
    run: PhaseRun,
    driver: Box<dyn CoilDriver>,
    done: SyncSender<TimerDone>,
}

struct TimerDone {
    driver: Box<dyn CoilDriver>,
    ticks: u32,
    error: Option<HalError>,
}

/// Long-lived timer thread that runs one [`PhaseRun`] at a time.
struct StepTimer {
    jobs: Option<Sender<TimerJob>>,
    handle: Option<JoinHandle<()>>,
}

impl StepTimer {
    fn spawn() -> Result<Self, HalError> {
        let (jobs, rx) = mpsc::channel::<TimerJob>();
        let handle = thread::Builder::new()
            .name("step-timer".to_string())
            .spawn(move || {
                for TimerJob {
                    mut run,
                    mut driver,
                    done,
                } in rx
                {
                    let (ticks, error) = drive(&mut run, driver.as_mut());
                    if done.send(TimerDone {
                        driver,
                        ticks,
                        error,
                    })
                    .is_err()
                    {
                        warn!("Step completion dropped: worker no longer waiting");
                    }
                }
                debug!("Step timer stopped");
            })
            .map_err(|e| HalError::InitFailed(format!("Failed to start step timer: {}", e)))?;

        Ok(Self {
            jobs: Some(jobs),
            handle: Some(handle),
        })
    }

    /// Hand `driver` to the timer thread and return the completion receiver.
    ///
    /// On failure the driver is handed straight back.
    fn start(
        &self,
        run: PhaseRun,
        driver: Box<dyn CoilDriver>,
    ) -> Result<Receiver<TimerDone>, Box<dyn CoilDriver>> {
        let Some(jobs) = &self.jobs else {
            return Err(driver);
        };
        let (done, completion) = mpsc::sync_channel(1);
        jobs.send(TimerJob { run, driver, done })
            .map(|()| completion)
            .map_err(|mpsc::SendError(job)| job.driver)
    }
}

impl Drop for StepTimer {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Step timer thread panicked");
            }
        }
    }
}

/// Computes step timing and runs coil sequences with the configured strategy.
pub struct PhaseSequencer {
    interval: Duration,
    timer: Option<StepTimer>,
}

impl PhaseSequencer {
    /// Build a sequencer for `config`.
    ///
    /// # Errors
    /// `HalError::InitFailed` if the timer thread cannot be started.
    pub fn new(config: &MotorConfig) -> Result<Self, HalError> {
        let interval = step_interval(config.steps_per_revolution, config.rpm);
        Self::with_interval(interval, config.stepping)
    }

    /// Build a sequencer with an explicit tick interval.
    pub fn with_interval(interval: Duration, mode: SteppingMode) -> Result<Self, HalError> {
        let timer = match mode {
            SteppingMode::Timer => Some(StepTimer::spawn()?),
            SteppingMode::Blocking => None,
        };
        debug!(
            "Phase sequencer ready: interval={}us, mode={:?}",
            interval.as_micros(),
            mode
        );
        Ok(Self { interval, timer })
    }

    /// Time between ticks.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Active strategy.
    pub fn mode(&self) -> SteppingMode {
        if self.timer.is_some() {
            SteppingMode::Timer
        } else {
            SteppingMode::Blocking
        }
    }

    /// Plan the index walk for `steps`.
    pub fn plan(&self, steps: i32) -> PhaseRun {
        PhaseRun::new(steps, self.interval)
    }

    /// Run `steps` to completion and de-energize the coils.
    ///
    /// A zero-step request writes the all-zero pattern and returns at once
    /// without issuing a tick.
    pub fn execute(&self, steps: i32, mut driver: Box<dyn CoilDriver>) -> Stepped {
        let mut run = self.plan(steps);
        let direction = i32::from(run.direction());
        let started = Instant::now();

        let (driver, ticks, mut error) = if run.is_complete() {
            (Some(driver), 0, None)
        } else if let Some(timer) = &self.timer {
            match timer.start(run, driver) {
                Ok(completion) => match completion.recv() {
                    Ok(done) => (Some(done.driver), done.ticks, done.error),
                    Err(_) => {
                        error!("Step timer exited without signalling completion");
                        (
                            None,
                            0,
                            Some(HalError::CommunicationError(
                                "step timer exited mid-move".to_string(),
                            )),
                        )
                    }
                },
                Err(driver) => (
                    Some(driver),
                    0,
                    Some(HalError::CommunicationError(
                        "step timer not running".to_string(),
                    )),
                ),
            }
        } else {
            let (ticks, error) = drive(&mut run, driver.as_mut());
            (Some(driver), ticks, error)
        };

        let driver = driver.map(|mut driver| {
            if let Err(e) = driver.set_lines(CoilPattern::empty()) {
                warn!("Failed to de-energize coils: {}", e);
                error.get_or_insert(e);
            }
            driver
        });

        let report = StepReport {
            ticks,
            traveled: direction * ticks as i32,
            elapsed: started.elapsed(),
            error,
        };
        Stepped { driver, report }
    }
}
