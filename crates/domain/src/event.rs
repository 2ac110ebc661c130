//! Device event: something observed by the platform that rules can react to.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::id::WakePointId;

/// An observation delivered to the engine.
///
/// Times are local wall-clock times: wake points track the user's clock,
/// not a fixed UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// A battery sample, in percent.
    Battery { level: u8, charging: bool },
    /// External power was connected (`plugged`) or removed.
    Power { plugged: bool },
    /// An armed wake point elapsed; `at` is the time it was scheduled for.
    WakePoint { id: WakePointId, at: NaiveDateTime },
}

impl DeviceEvent {
    /// A battery sample with `level` clamped to `0..=100`.
    #[must_use]
    pub fn battery(level: u8, charging: bool) -> Self {
        Self::Battery {
            level: level.min(100),
            charging,
        }
    }
}

impl fmt::Display for DeviceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Battery { level, charging } => {
                write!(f, "battery({level}%, charging={charging})")
            }
            Self::Power { plugged } => write!(f, "power(plugged={plugged})"),
            Self::WakePoint { id, at } => write!(f, "wake_point({id} @ {at})"),
        }
    }
}
