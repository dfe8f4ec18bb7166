//! Shared fixtures.

use blinds_common::motor::config::SteppingMode;
use blinds_motion::drivers::simulation::{CoilProbe, SimulatedCoils};
use blinds_motion::engine::MotionEngine;
use blinds_motion::position::PositionStore;
use blinds_motion::sequencer::PhaseSequencer;
use blinds_common::storage::ByteStore;
use std::path::Path;
use std::time::Duration;

/// Generous bound for a move to finish on a loaded CI machine.
pub const WAIT: Duration = Duration::from_secs(10);

/// Fast tick so moves of a few dozen steps finish in milliseconds.
pub const FAST: Duration = Duration::from_micros(100);

/// Start an engine over `store` with fresh simulated coils.
pub fn start_engine(
    store: Box<dyn ByteStore>,
    path: &Path,
    interval: Duration,
    mode: SteppingMode,
) -> (MotionEngine, CoilProbe) {
    start_engine_with(store, path, interval, mode, SimulatedCoils::new())
}

/// Start an engine over `store` driving the given coils.
pub fn start_engine_with(
    store: Box<dyn ByteStore>,
    path: &Path,
    interval: Duration,
    mode: SteppingMode,
    coils: SimulatedCoils,
) -> (MotionEngine, CoilProbe) {
    let probe = coils.probe();
    let sequencer = PhaseSequencer::with_interval(interval, mode).unwrap();
    let positions = PositionStore::open(store, path).unwrap();
    let engine = MotionEngine::start(sequencer, Box::new(coils), positions).unwrap();
    (engine, probe)
}
