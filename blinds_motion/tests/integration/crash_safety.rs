//! Integration test: crash-safe persistence.
//!
//! Validates: a move interrupted after the record was deleted reloads as
//! unknown, and persistence failures are reported without undoing motion.

use blinds_common::motor::config::SteppingMode;
use blinds_common::motor::types::PositionState;
use blinds_common::storage::ByteStore;
use blinds_motion::engine::{MoveAdmission, MoveOutcome};
use blinds_motion::position::PositionStore;
use blinds_motion::drivers::simulation::SimulatedCoils;
use blinds_motion::store::{FsStore, MemoryStore};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

use super::common::{FAST, WAIT, start_engine, start_engine_with};

#[test]
fn simulated_crash_reloads_unknown() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    fs::write(&path, [90, 0, 45, 0]).unwrap();

    // Power lost after delete-before, before write-after.
    let mut positions = PositionStore::open(Box::new(FsStore::new()), &path).unwrap();
    assert_eq!(positions.state(), PositionState::new(90, 45));
    positions.begin_move().unwrap();
    drop(positions);
    assert!(!FsStore::new().exists(&path).unwrap());

    let (engine, _probe) =
        start_engine(Box::new(FsStore::new()), &path, FAST, SteppingMode::Timer);
    assert_eq!(engine.status(), PositionState::UNINITIALIZED);
    // Startup recreated an empty record.
    assert_eq!(fs::read(&path).unwrap(), Vec::<u8>::new());
}

#[test]
fn truncated_record_loads_unknown() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("state.bin");
    fs::write(&path, [7, 0]).unwrap();

    let positions = PositionStore::open(Box::new(FsStore::new()), &path).unwrap();
    assert_eq!(positions.state(), PositionState::UNINITIALIZED);
}

#[test]
fn delete_failure_keeps_motor_still() {
    let mem = MemoryStore::new();
    let path = Path::new("/flash/state.bin");
    mem.insert_raw(path, vec![40, 0, 20, 0]);
    let (engine, probe) = start_engine(Box::new(mem.clone()), path, FAST, SteppingMode::Timer);

    mem.set_fail_deletes(true);
    assert_eq!(engine.submit(10).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));

    assert_eq!(probe.tick_count(), 0);
    assert_eq!(engine.status(), PositionState::new(40, 20));
    assert!(matches!(
        engine.last_outcome(),
        Some(MoveOutcome::Failed { ticks: 0, .. })
    ));

    // Gate was released; the next move works once storage recovers.
    mem.set_fail_deletes(false);
    assert_eq!(engine.submit(10).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));
    assert_eq!(engine.status(), PositionState::new(40, 30));
    assert_eq!(mem.raw(path), Some(vec![40, 0, 30, 0]));
}

#[test]
fn write_failure_keeps_memory_state() {
    let mem = MemoryStore::new();
    let path = Path::new("/flash/state.bin");
    mem.insert_raw(path, vec![40, 0, 20, 0]);
    let (engine, probe) = start_engine(Box::new(mem.clone()), path, FAST, SteppingMode::Blocking);

    mem.set_fail_writes(true);
    assert_eq!(engine.submit(-5).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));

    assert_eq!(probe.tick_count(), 5);
    assert_eq!(engine.status(), PositionState::new(40, 15));
    // Nothing was written back, so a restart would see an unknown position.
    assert_eq!(mem.raw(path), None);
    match engine.last_outcome() {
        Some(MoveOutcome::Failed { ticks, state, reason, .. }) => {
            assert_eq!(ticks, 5);
            assert_eq!(state, PositionState::new(40, 15));
            assert!(reason.contains("persist"));
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[test]
fn reset_write_failure_is_reported() {
    let mem = MemoryStore::new();
    let path = Path::new("/flash/state.bin");
    mem.insert_raw(path, vec![40, 0, 20, 0]);
    let (engine, _probe) = start_engine(Box::new(mem.clone()), path, FAST, SteppingMode::Timer);

    mem.set_fail_writes(true);
    assert!(engine.reset().is_err());
    assert!(!engine.is_moving());
    assert_eq!(engine.status(), PositionState::UNINITIALIZED);
}

#[test]
fn output_fault_mid_move_keeps_traveled_steps() {
    for mode in [SteppingMode::Timer, SteppingMode::Blocking] {
        let mem = MemoryStore::new();
        let path = Path::new("/flash/state.bin");
        let (engine, probe) = start_engine_with(
            Box::new(mem.clone()),
            path,
            FAST,
            mode,
            SimulatedCoils::new().fail_after(3),
        );

        assert_eq!(engine.submit(10).unwrap(), MoveAdmission::Accepted);
        assert!(engine.wait_idle(WAIT));

        assert_eq!(probe.tick_count(), 3);
        assert_eq!(engine.status(), PositionState::new(3, 3), "{mode:?}");
        assert_eq!(mem.raw(path), Some(vec![3, 0, 3, 0]));
        match engine.last_outcome() {
            Some(MoveOutcome::Failed {
                steps,
                ticks,
                state,
                reason,
            }) => {
                assert_eq!(steps, 10);
                assert_eq!(ticks, 3);
                assert_eq!(state, PositionState::new(3, 3));
                assert!(reason.contains("output failure after 3 ticks"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(!engine.is_moving());
    }
}

#[test]
fn output_fault_on_first_tick_keeps_position() {
    let mem = MemoryStore::new();
    let path = Path::new("/flash/state.bin");
    mem.insert_raw(path, vec![50, 0, 20, 0]);
    let (engine, probe) = start_engine_with(
        Box::new(mem.clone()),
        path,
        FAST,
        SteppingMode::Timer,
        SimulatedCoils::new().fail_after(0),
    );

    assert_eq!(engine.submit(-8).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));

    assert_eq!(probe.tick_count(), 0);
    assert_eq!(engine.status(), PositionState::new(50, 20));
    // Record was deleted before motion and written back unchanged.
    assert_eq!(mem.raw(path), Some(vec![50, 0, 20, 0]));
    assert!(matches!(
        engine.last_outcome(),
        Some(MoveOutcome::Failed { ticks: 0, .. })
    ));
}

#[test]
fn output_fault_from_unknown_position_stays_unknown() {
    let mem = MemoryStore::new();
    let path = Path::new("/flash/state.bin");
    let (engine, _probe) = start_engine_with(
        Box::new(mem.clone()),
        path,
        FAST,
        SteppingMode::Blocking,
        SimulatedCoils::new().fail_after(0),
    );

    assert_eq!(engine.submit(5).unwrap(), MoveAdmission::Accepted);
    assert!(engine.wait_idle(WAIT));

    assert_eq!(engine.status(), PositionState::UNINITIALIZED);
    assert_eq!(mem.raw(path), Some(vec![0xFF; 4]));
}
