//! JSON-lines command gateway.
//!
//! One request object per line, one response object per line. Requests are
//! tagged by `op`:
//!
//! ```text
//! {"op":"system_info"}             -> {"version":"0.1.0","cores":4}
//! {"op":"status"}                  -> {"max_steps":60,"current_step":0,"moving":false}
//! {"op":"unsafe_move","steps":50}  -> {"msg":"OK"}
//! {"op":"move","fraction":0.5}     -> {"msg":"OK"}
//! {"op":"reset_state"}             -> {"msg":"OK"}
//! ```
//!
//! A move submitted while another is in flight answers
//! `{"msg":"Stepper is still moving"}`. Failures answer
//! `{"error":"...","code":400|500}`.

use blinds_common::consts::MAX_REQUEST_LEN;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::engine::{MotionEngine, MoveAdmission, ResetAck};
use crate::error::MotionError;

/// Acknowledgement text.
pub const MSG_OK: &str = "OK";

/// Busy rejection text.
pub const MSG_BUSY: &str = "Stepper is still moving";

/// Parsed gateway request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    /// Firmware version and core count.
    SystemInfo,
    /// Position snapshot.
    Status,
    /// Relative move; may run outside the known range.
    UnsafeMove {
        /// Signed step count
        steps: i32,
    },
    /// Absolute move to a fraction of the known range.
    Move {
        /// Target in `[0, 1]`
        fraction: f64,
    },
    /// Forget the position.
    ResetState,
}

/// Gateway response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    /// Reply to `system_info`
    SystemInfo {
        /// Crate version
        version: String,
        /// Available hardware threads
        cores: usize,
    },
    /// Reply to `status`
    Status {
        /// High end of the known range, `-1` if unknown
        max_steps: i16,
        /// Current step, `-1` if unknown
        current_step: i16,
        /// Whether a move is in flight
        moving: bool,
    },
    /// Acknowledgement or busy rejection
    Message {
        /// `OK` or the busy text
        msg: String,
    },
    /// Request failure
    Error {
        /// Human-readable cause
        error: String,
        /// 400 for bad input, 500 for internal failures
        code: u16,
    },
}

impl Response {
    fn message(msg: &str) -> Self {
        Response::Message {
            msg: msg.to_string(),
        }
    }

    fn from_admission(admission: MoveAdmission) -> Self {
        match admission {
            MoveAdmission::Accepted => Self::message(MSG_OK),
            MoveAdmission::Busy => Self::message(MSG_BUSY),
        }
    }

    fn from_reset(ack: ResetAck) -> Self {
        match ack {
            ResetAck::Done => Self::message(MSG_OK),
            ResetAck::Busy => Self::message(MSG_BUSY),
        }
    }
}

/// Request line could not be turned into a [`Request`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Line reaches [`MAX_REQUEST_LEN`].
    #[error("Request too long: {len} bytes (must be under {limit})")]
    TooLong {
        /// Received length
        len: usize,
        /// Accepted maximum
        limit: usize,
    },

    /// Not a valid request object.
    #[error("Malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl From<GatewayError> for Response {
    fn from(e: GatewayError) -> Self {
        Response::Error {
            error: e.to_string(),
            code: 400,
        }
    }
}

impl From<MotionError> for Response {
    fn from(e: MotionError) -> Self {
        let code = match e {
            MotionError::Validation(_) => 400,
            _ => 500,
        };
        Response::Error {
            error: e.to_string(),
            code,
        }
    }
}

/// Parse one request line.
///
/// # Errors
/// `TooLong` before any parsing is attempted, `Malformed` for bad JSON or an
/// unknown `op`. Lines must be shorter than [`MAX_REQUEST_LEN`] bytes.
pub fn parse_request(line: &str) -> Result<Request, GatewayError> {
    if line.len() >= MAX_REQUEST_LEN {
        return Err(GatewayError::TooLong {
            len: line.len(),
            limit: MAX_REQUEST_LEN,
        });
    }
    Ok(serde_json::from_str(line.trim())?)
}

/// Run `request` against `engine`.
pub fn dispatch(engine: &MotionEngine, request: Request) -> Response {
    debug!("Gateway request: {:?}", request);
    let result = match request {
        Request::SystemInfo => Ok(Response::SystemInfo {
            version: env!("CARGO_PKG_VERSION").to_string(),
            cores: std::thread::available_parallelism().map_or(1, |n| n.get()),
        }),
        Request::Status => {
            let state = engine.status();
            Ok(Response::Status {
                max_steps: state.max_steps,
                current_step: state.current_step,
                moving: engine.is_moving(),
            })
        }
        Request::UnsafeMove { steps } => engine.submit(steps).map(Response::from_admission),
        Request::Move { fraction } => engine
            .move_to_fraction(fraction)
            .map(Response::from_admission),
        Request::ResetState => engine.reset().map(Response::from_reset),
    };

    result.unwrap_or_else(|e| {
        warn!("Request failed: {}", e);
        Response::from(e)
    })
}

/// Handle one raw line and return the serialized response.
pub fn handle_line(engine: &MotionEngine, line: &str) -> String {
    let response = match parse_request(line) {
        Ok(request) => dispatch(engine, request),
        Err(e) => {
            warn!("Rejected request: {}", e);
            Response::from(e)
        }
    };
    serde_json::to_string(&response).unwrap_or_else(|e| {
        format!(r#"{{"error":"failed to encode response: {}","code":500}}"#, e)
    })
}
