//! Health reminders: interval nudges during working hours.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::id::WakePointId;
use crate::schedule::{WorkHours, next_interval_fire};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Stand up after sitting too long.
    Sit,
    /// Drink some water.
    Water,
    /// Rest the eyes.
    Eye,
}

impl ReminderKind {
    pub const ALL: [Self; 3] = [Self::Sit, Self::Water, Self::Eye];

    /// Wake point key this reminder is armed under.
    #[must_use]
    pub fn wake_point(self) -> WakePointId {
        WakePointId::new(format!("health:{self}"))
    }

    /// Inverse of [`ReminderKind::wake_point`].
    #[must_use]
    pub fn from_wake_point(id: &WakePointId) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.wake_point() == *id)
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Sit => "💺 久坐提醒",
            Self::Water => "💧 喝水提醒",
            Self::Eye => "👁️ 眼保健提醒",
        }
    }

    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::Sit => "已经坐了 1 小时，起来活动活动吧~",
            Self::Water => "记得多喝水，保持身体健康~",
            Self::Eye => "看看远方，做做眼保健操~",
        }
    }
}

impl fmt::Display for ReminderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sit => f.write_str("sit"),
            Self::Water => f.write_str("water"),
            Self::Eye => f.write_str("eye"),
        }
    }
}

/// One reminder's toggle and interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSchedule {
    pub enabled: bool,
    pub interval_minutes: u32,
}

/// All reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub sit: ReminderSchedule,
    pub water: ReminderSchedule,
    pub eye: ReminderSchedule,
    pub work_start_hour: u8,
    pub work_end_hour: u8,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            sit: ReminderSchedule {
                enabled: true,
                interval_minutes: 60,
            },
            water: ReminderSchedule {
                enabled: true,
                interval_minutes: 120,
            },
            eye: ReminderSchedule {
                enabled: true,
                interval_minutes: 45,
            },
            work_start_hour: 9,
            work_end_hour: 18,
        }
    }
}

impl ReminderSettings {
    #[must_use]
    pub fn schedule(&self, kind: ReminderKind) -> ReminderSchedule {
        match kind {
            ReminderKind::Sit => self.sit,
            ReminderKind::Water => self.water,
            ReminderKind::Eye => self.eye,
        }
    }

    #[must_use]
    pub fn work_hours(&self) -> WorkHours {
        WorkHours {
            start: self.work_start_hour,
            end: self.work_end_hour,
        }
    }

    /// When `kind` should fire next after `now`.
    #[must_use]
    pub fn next_fire(&self, kind: ReminderKind, now: NaiveDateTime) -> NaiveDateTime {
        let minutes = i64::from(self.schedule(kind).interval_minutes);
        next_interval_fire(now, TimeDelta::minutes(minutes), self.work_hours())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_round_trip_wake_point_key() {
        for kind in ReminderKind::ALL {
            assert_eq!(ReminderKind::from_wake_point(&kind.wake_point()), Some(kind));
        }
        assert_eq!(
            ReminderKind::from_wake_point(&WakePointId::new("rule:bedtime:0")),
            None
        );
    }

    #[test]
    fn should_use_per_kind_interval() {
        let settings = ReminderSettings::default();
        let now = NaiveDateTime::parse_from_str("2026-03-04 10:10", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(settings.next_fire(ReminderKind::Sit, now).to_string(), "2026-03-04 11:00:00");
        assert_eq!(settings.next_fire(ReminderKind::Water, now).to_string(), "2026-03-04 12:00:00");
        assert_eq!(settings.next_fire(ReminderKind::Eye, now).to_string(), "2026-03-04 10:45:00");
    }
}
