//! System-wide constants for the blinds workspace.
//!
//! Single source of truth for numeric defaults and default paths.

/// Number of coil output lines on a unipolar stepper.
pub const COIL_LINES: usize = 4;

/// Size of the persisted position record in bytes.
pub const RECORD_SIZE: usize = 4;

/// Default steps per revolution (28BYJ-48 in full-step mode).
pub const DEFAULT_STEPS_PER_REVOLUTION: u32 = 2048;

/// Default rotational speed in revolutions per minute.
pub const DEFAULT_RPM: u32 = 10;

/// Default GPIO lines for coils 1..4.
pub const DEFAULT_PINS: [u32; COIL_LINES] = [26, 27, 14, 12];

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/blinds/blinds.toml";

/// Default position record path.
pub const DEFAULT_STATE_FILE: &str = "/var/lib/blinds/state.bin";

/// Canonical service name used when logging.
pub const SERVICE_NAME: &str = "blinds_motion";

/// Microseconds per minute, the numerator of the step interval.
pub const MICROS_PER_MINUTE: u64 = 60_000_000;

/// Gateway request buffer size; a line must be shorter than this.
pub const MAX_REQUEST_LEN: usize = 1024;
