//! Trigger: the device or clock condition that fires a rule.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::time::ClockTime;

/// Direction of a power transition a [`Trigger::Power`] waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerState {
    Plugged,
    Unplugged,
}

impl PowerState {
    /// Whether a device that is now `plugged` is in this state.
    #[must_use]
    pub fn is_satisfied_by(self, plugged: bool) -> bool {
        match self {
            Self::Plugged => plugged,
            Self::Unplugged => !plugged,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plugged => f.write_str("plugged"),
            Self::Unplugged => f.write_str("unplugged"),
        }
    }
}

/// Describes when a rule should fire.
///
/// Each incoming event kind is only compared with triggers of the same kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    /// Fires at a wall-clock time, optionally restricted to some weekdays
    /// (`0` = Sunday). An absent `days` set means every day.
    Time {
        time: ClockTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        days: Option<BTreeSet<u8>>,
    },
    /// Fires when the battery level is at or below `level_below` percent.
    Battery {
        #[serde(alias = "levelBelow")]
        level_below: u8,
    },
    /// Fires on a power transition.
    Power { state: PowerState },
    /// A trigger type this version does not know about. Never fires.
    #[serde(other)]
    Unknown,
}

/// Kind of a [`Trigger`], as recorded in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Time,
    Battery,
    Power,
    Unknown,
}

impl Trigger {
    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Time { .. } => TriggerKind::Time,
            Self::Battery { .. } => TriggerKind::Battery,
            Self::Power { .. } => TriggerKind::Power,
            Self::Unknown => TriggerKind::Unknown,
        }
    }

    /// Exact match on the time of day, then on the weekday when `days` is set.
    #[must_use]
    pub fn matches_time(&self, current: ClockTime, weekday: u8) -> bool {
        match self {
            Self::Time { time, days } => {
                *time == current && days.as_ref().is_none_or(|days| days.contains(&weekday))
            }
            _ => false,
        }
    }

    /// Charging state is tracked by callers but does not restrict battery triggers.
    #[must_use]
    pub fn matches_battery(&self, level: u8) -> bool {
        match self {
            Self::Battery { level_below } => level <= *level_below,
            _ => false,
        }
    }

    #[must_use]
    pub fn matches_power(&self, plugged: bool) -> bool {
        match self {
            Self::Power { state } => state.is_satisfied_by(plugged),
            _ => false,
        }
    }

    /// Check value ranges that the JSON shape alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidWeekday`] for a day outside `0..=6`
    /// and [`ValidationError::InvalidBatteryLevel`] for a threshold above 100.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Time {
                days: Some(days), ..
            } => match days.iter().find(|day| **day > 6) {
                Some(day) => Err(ValidationError::InvalidWeekday(*day)),
                None => Ok(()),
            },
            Self::Battery { level_below } if *level_below > 100 => {
                Err(ValidationError::InvalidBatteryLevel(*level_below))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time => f.write_str("time"),
            Self::Battery => f.write_str("battery"),
            Self::Power => f.write_str("power"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Time { time, days: None } => write!(f, "time({time})"),
            Self::Time {
                time,
                days: Some(days),
            } => write!(f, "time({time}, days={days:?})"),
            Self::Battery { level_below } => write!(f, "battery(<= {level_below}%)"),
            Self::Power { state } => write!(f, "power({state})"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
