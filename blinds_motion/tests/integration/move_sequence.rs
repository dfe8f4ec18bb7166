//! Integration test: move sequences on the filesystem store.
//!
//! Validates: uninitialized start → 50 / -20 / -40 → (60, 0) in memory and
//! on disk, identical results for both stepping strategies, and the busy
//! rejection leaving everything untouched.

use blinds_common::motor::config::SteppingMode;
use blinds_common::motor::types::PositionState;
use blinds_motion::engine::{MoveAdmission, MoveOutcome, ResetAck};
use blinds_motion::position::PositionStore;
use blinds_motion::store::FsStore;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

use super::common::{FAST, WAIT, start_engine};

#[test]
fn reference_sequence_both_modes() {
    for mode in [SteppingMode::Timer, SteppingMode::Blocking] {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.bin");
        let (engine, probe) = start_engine(Box::new(FsStore::new()), &path, FAST, mode);
        assert_eq!(engine.status(), PositionState::UNINITIALIZED);

        let expected = [
            (50, PositionState::new(50, 50)),
            (-20, PositionState::new(50, 30)),
            (-40, PositionState::new(60, 0)),
        ];
        for (steps, state) in expected {
            assert_eq!(engine.submit(steps).unwrap(), MoveAdmission::Accepted);
            assert!(engine.wait_idle(WAIT));
            assert_eq!(engine.status(), state, "{mode:?} after {steps}");
            assert!(probe.lines().is_empty());
        }

        assert_eq!(probe.tick_count(), 110);
        assert_eq!(fs::read(&path).unwrap(), vec![60, 0, 0, 0]);

        drop(engine);
        let reloaded = PositionStore::open(Box::new(FsStore::new()), &path).unwrap();
        assert_eq!(reloaded.state(), PositionState::new(60, 0));
    }
}

#[test]
fn busy_submission_changes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    fs::write(&path, [100, 0, 10, 0]).unwrap();

    let (engine, _probe) = start_engine(
        Box::new(FsStore::new()),
        &path,
        Duration::from_millis(5),
        SteppingMode::Timer,
    );

    assert_eq!(engine.submit(40).unwrap(), MoveAdmission::Accepted);
    assert!(engine.is_moving());
    std::thread::sleep(Duration::from_millis(50));

    // Record is deleted for the duration of the move.
    let before_state = engine.status();
    let before_bytes = fs::read(&path).ok();
    assert_eq!(before_bytes, None);

    assert_eq!(engine.submit(7).unwrap(), MoveAdmission::Busy);
    assert_eq!(engine.move_to_fraction(0.5).unwrap(), MoveAdmission::Busy);
    assert_eq!(engine.reset().unwrap(), ResetAck::Busy);
    assert_eq!(engine.status(), before_state);
    assert_eq!(fs::read(&path).ok(), before_bytes);

    assert!(engine.wait_idle(WAIT));
    assert_eq!(engine.status(), PositionState::new(100, 50));
    assert_eq!(fs::read(&path).unwrap(), vec![100, 0, 50, 0]);
}

#[test]
fn zero_step_move_completes_without_ticks() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    let (engine, probe) = start_engine(
        Box::new(FsStore::new()),
        &path,
        Duration::from_secs(1),
        SteppingMode::Timer,
    );

    assert_eq!(engine.submit(0).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(Duration::from_millis(900)));
    assert_eq!(probe.tick_count(), 0);
    assert!(probe.lines().is_empty());
    assert_eq!(engine.status(), PositionState::new(0, 0));
    assert!(matches!(
        engine.last_outcome(),
        Some(MoveOutcome::Completed { ticks: 0, .. })
    ));
}

#[test]
fn reset_is_idempotent_on_disk_and_in_memory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    fs::write(&path, [30, 0, 12, 0]).unwrap();
    let (engine, _probe) =
        start_engine(Box::new(FsStore::new()), &path, FAST, SteppingMode::Blocking);

    for _ in 0..2 {
        assert_eq!(engine.reset().unwrap(), ResetAck::Done);
        assert!(!engine.is_moving());
        assert_eq!(engine.status(), PositionState::UNINITIALIZED);
        assert_eq!(fs::read(&path).unwrap(), vec![0xFF; 4]);
    }
}

#[test]
fn fraction_move_after_calibration() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    let (engine, _probe) =
        start_engine(Box::new(FsStore::new()), &path, FAST, SteppingMode::Timer);

    assert!(engine.move_to_fraction(0.5).is_err());
    assert!(!engine.is_moving());

    assert_eq!(engine.submit(80).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));
    assert_eq!(engine.move_to_fraction(0.25).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));
    assert_eq!(engine.status(), PositionState::new(80, 20));

    assert_eq!(engine.move_to_fraction(1.0).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));
    assert_eq!(engine.status(), PositionState::new(80, 80));
}
