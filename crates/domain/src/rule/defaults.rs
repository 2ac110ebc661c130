//! The rule set seeded on first run.

use super::{Action, Rule, Trigger};
use crate::id::RuleId;
use crate::time::ClockTime;

fn clock(hour: u8, minute: u8) -> ClockTime {
    // literal hours and minutes below are in range
    ClockTime::new(hour, minute).unwrap_or_default()
}

/// Morning speech, low-battery notification and bedtime speech.
#[must_use]
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            id: RuleId::new("morning_routine"),
            name: "☀️ 早晨提醒".to_string(),
            enabled: true,
            triggers: vec![Trigger::Time {
                time: clock(7, 0),
                days: None,
            }],
            actions: vec![Action::Speak {
                text: None,
                template: Some("weather_commute".to_string()),
            }],
        },
        Rule {
            id: RuleId::new("low_battery"),
            name: "🔋 低电量提醒".to_string(),
            enabled: true,
            triggers: vec![Trigger::Battery { level_below: 20 }],
            actions: vec![Action::Notify {
                title: "电量低".to_string(),
                message: Some("电量低于 20%，建议充电".to_string()),
            }],
        },
        Rule {
            id: RuleId::new("bedtime"),
            name: "🌙 睡前提醒".to_string(),
            enabled: true,
            triggers: vec![Trigger::Time {
                time: clock(23, 0),
                days: None,
            }],
            actions: vec![Action::Speak {
                text: None,
                template: Some("tomorrow_weather".to_string()),
            }],
        },
    ]
}
