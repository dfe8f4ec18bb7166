//! Integration test: JSON-lines gateway against a live engine.

use blinds_common::motor::config::SteppingMode;
use blinds_motion::gateway::handle_line;
use blinds_motion::store::MemoryStore;
use serde_json::{Value, json};
use std::path::Path;
use std::time::Duration;

use super::common::{FAST, WAIT, start_engine};

fn call(engine: &blinds_motion::MotionEngine, line: &str) -> Value {
    serde_json::from_str(&handle_line(engine, line)).unwrap()
}

#[test]
fn request_round_trip() {
    let mem = MemoryStore::new();
    let (engine, _probe) = start_engine(
        Box::new(mem),
        Path::new("/state.bin"),
        FAST,
        SteppingMode::Timer,
    );

    assert_eq!(
        call(&engine, r#"{"op":"status"}"#),
        json!({"max_steps": -1, "current_step": -1, "moving": false})
    );

    let info = call(&engine, r#"{"op":"system_info"}"#);
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
    assert!(info["cores"].as_u64().unwrap() >= 1);

    assert_eq!(
        call(&engine, r#"{"op":"move","fraction":0.5}"#),
        json!({"error": "State uninitialized", "code": 500})
    );

    assert_eq!(
        call(&engine, r#"{"op":"unsafe_move","steps":30}"#),
        json!({"msg": "OK"})
    );
    assert!(engine.wait_idle(WAIT));

    assert_eq!(
        call(&engine, r#"{"op":"move","fraction":1.5}"#)["code"],
        400
    );
    assert_eq!(call(&engine, r#"{"op":"warp"}"#)["code"], 400);

    assert_eq!(
        call(&engine, r#"{"op":"status"}"#),
        json!({"max_steps": 30, "current_step": 30, "moving": false})
    );

    assert_eq!(call(&engine, r#"{"op":"reset_state"}"#), json!({"msg": "OK"}));
    assert_eq!(
        call(&engine, r#"{"op":"status"}"#),
        json!({"max_steps": -1, "current_step": -1, "moving": false})
    );
}

#[test]
fn busy_reply_while_moving() {
    let (engine, _probe) = start_engine(
        Box::new(MemoryStore::new()),
        Path::new("/state.bin"),
        Duration::from_millis(5),
        SteppingMode::Timer,
    );

    assert_eq!(
        call(&engine, r#"{"op":"unsafe_move","steps":40}"#),
        json!({"msg": "OK"})
    );
    assert_eq!(
        call(&engine, r#"{"op":"unsafe_move","steps":1}"#),
        json!({"msg": "Stepper is still moving"})
    );
    assert_eq!(
        call(&engine, r#"{"op":"reset_state"}"#),
        json!({"msg": "Stepper is still moving"})
    );
    assert_eq!(call(&engine, r#"{"op":"status"}"#)["moving"], true);
    assert!(engine.wait_idle(WAIT));
}
