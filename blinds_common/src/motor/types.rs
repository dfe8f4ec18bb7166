//! Coil pattern and position types.
//!
//! - `CoilPattern` - 4-bit set of energized coil lines
//! - `PHASE_TABLE` - Full-step wave sequence
//! - `PositionState` - Position/range pair owned by the motion engine
//! - `PositionRecord` - On-disk form of `PositionState`

use crate::consts::RECORD_SIZE;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use static_assertions::assert_eq_size;

bitflags! {
    /// Energized coil lines. Bit 3 is coil 1, bit 0 is coil 4.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CoilPattern: u8 {
        /// Coil 1
        const COIL_1 = 0b1000;
        /// Coil 2
        const COIL_2 = 0b0100;
        /// Coil 3
        const COIL_3 = 0b0010;
        /// Coil 4
        const COIL_4 = 0b0001;
    }
}

impl CoilPattern {
    /// Coil flags in output line order.
    pub const LINES: [CoilPattern; 4] = [
        CoilPattern::COIL_1,
        CoilPattern::COIL_2,
        CoilPattern::COIL_3,
        CoilPattern::COIL_4,
    ];

    /// Level of each output line, coil 1 first.
    pub fn levels(self) -> [bool; 4] {
        Self::LINES.map(|line| self.contains(line))
    }
}

/// Phase patterns indexed by `step mod 4`.
pub const PHASE_TABLE: [CoilPattern; 4] = [
    CoilPattern::from_bits_retain(0b1010),
    CoilPattern::from_bits_retain(0b0110),
    CoilPattern::from_bits_retain(0b0101),
    CoilPattern::from_bits_retain(0b1001),
];

/// Position of the actuator and the furthest range reached.
///
/// Either both fields are `-1` (position unknown) or
/// `0 <= current_step <= max_steps`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionState {
    /// High-water mark since the last reset.
    pub max_steps: i16,
    /// Current step, counted from the low end of the range.
    pub current_step: i16,
}

impl PositionState {
    /// Position unknown.
    pub const UNINITIALIZED: PositionState = PositionState {
        max_steps: -1,
        current_step: -1,
    };

    /// Build a state from raw fields.
    pub const fn new(max_steps: i16, current_step: i16) -> Self {
        Self {
            max_steps,
            current_step,
        }
    }

    /// True when both fields are non-negative.
    pub fn is_initialized(&self) -> bool {
        self.max_steps >= 0 && self.current_step >= 0
    }

    /// True for `(-1, -1)` or a pair satisfying `0 <= current <= max`.
    pub fn is_consistent(&self) -> bool {
        *self == Self::UNINITIALIZED
            || (self.is_initialized() && self.current_step <= self.max_steps)
    }

    /// Position after moving `steps` from this state.
    ///
    /// An unknown position adopts a fresh `(0, 0)` window first. The range's
    /// high end follows the furthest reach. Undershooting below zero clamps
    /// the position to zero and raises `max_steps` by the overshoot.
    pub fn after_move(self, steps: i32) -> PositionState {
        let (mut max, mut cur) = if self.is_initialized() {
            (i32::from(self.max_steps), i32::from(self.current_step))
        } else {
            (0, 0)
        };

        cur = cur.saturating_add(steps);
        if cur >= max {
            max = cur;
        }
        if cur < 0 {
            max = max.saturating_sub(cur);
            cur = 0;
        }

        PositionState {
            max_steps: saturate_i16(max),
            current_step: saturate_i16(cur),
        }
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::UNINITIALIZED
    }
}

fn saturate_i16(value: i32) -> i16 {
    value.clamp(0, i32::from(i16::MAX)) as i16
}

/// The 4-byte persisted record: `max_steps` then `current_step`, both
/// little-endian `i16`. No header, checksum or version.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionRecord {
    /// Persisted `max_steps`
    pub max_steps: i16,
    /// Persisted `current_step`
    pub current_step: i16,
}

assert_eq_size!(PositionRecord, [u8; RECORD_SIZE]);

impl PositionRecord {
    /// Encode to the fixed on-disk layout.
    pub fn encode(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Decode from the fixed on-disk layout.
    ///
    /// Returns `None` when `bytes` is not exactly one record long.
    pub fn decode(bytes: &[u8]) -> Option<PositionRecord> {
        if bytes.len() != RECORD_SIZE {
            return None;
        }
        bincode::deserialize(bytes).ok()
    }
}

impl From<PositionState> for PositionRecord {
    fn from(state: PositionState) -> Self {
        Self {
            max_steps: state.max_steps,
            current_step: state.current_step,
        }
    }
}

impl From<PositionRecord> for PositionState {
    fn from(record: PositionRecord) -> Self {
        Self {
            max_steps: record.max_steps,
            current_step: record.current_step,
        }
    }
}
