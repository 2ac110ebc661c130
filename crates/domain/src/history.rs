//! Execution history: the capped firing log and the usage counters.

use std::collections::{BTreeMap, VecDeque};

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use serde::{Deserialize, Serialize};

use crate::id::RuleId;
use crate::rule::{ActionKind, TriggerKind};
use crate::time::Timestamp;

/// Maximum number of entries kept in an [`ExecutionLog`].
pub const MAX_LOG_ENTRIES: usize = 100;

/// One line of the execution log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub timestamp: Timestamp,
    pub rule_id: RuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger_kind: Option<TriggerKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_kind: Option<ActionKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl LogEntry {
    /// A rule fired because of a trigger of `kind`.
    #[must_use]
    pub fn trigger(
        timestamp: Timestamp,
        rule_id: RuleId,
        rule_name: impl Into<String>,
        kind: TriggerKind,
    ) -> Self {
        Self {
            timestamp,
            rule_id,
            rule_name: Some(rule_name.into()),
            trigger_kind: Some(kind),
            action_kind: None,
            details: None,
        }
    }

    /// Something worth recording happened while running one action of a rule.
    #[must_use]
    pub fn action(
        timestamp: Timestamp,
        rule_id: RuleId,
        kind: ActionKind,
        details: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            rule_id,
            rule_name: None,
            trigger_kind: None,
            action_kind: Some(kind),
            details: Some(details.into()),
        }
    }
}

/// Newest-first log capped at [`MAX_LOG_ENTRIES`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<LogEntry>", into = "Vec<LogEntry>")]
pub struct ExecutionLog {
    entries: VecDeque<LogEntry>,
}

impl ExecutionLog {
    /// Insert at the front, evicting the oldest entry past the cap.
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(MAX_LOG_ENTRIES);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<LogEntry>> for ExecutionLog {
    fn from(mut entries: Vec<LogEntry>) -> Self {
        entries.truncate(MAX_LOG_ENTRIES);
        Self {
            entries: entries.into(),
        }
    }
}

impl From<ExecutionLog> for Vec<LogEntry> {
    fn from(log: ExecutionLog) -> Self {
        log.entries.into()
    }
}

/// Per-rule count inside one day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRuleCount {
    pub name: String,
    pub count: u64,
}

/// Monotonic usage counters.
///
/// Persisted as a flat key-value map (see [`UsageStats::to_entries`]):
/// `today_<date>`, `rule_<id>`, `hour_<HH>` hold counts and
/// `daily_<date>` holds a `{rule_id: {name, count}}` object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStats {
    day_totals: BTreeMap<NaiveDate, u64>,
    rule_totals: BTreeMap<RuleId, u64>,
    hours: [u64; 24],
    daily_rules: BTreeMap<NaiveDate, BTreeMap<RuleId, DailyRuleCount>>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

impl UsageStats {
    /// Count one firing of a rule at local time `at`.
    pub fn record(&mut self, rule_id: &RuleId, rule_name: &str, at: NaiveDateTime) {
        let date = at.date();
        *self.day_totals.entry(date).or_default() += 1;
        *self.rule_totals.entry(rule_id.clone()).or_default() += 1;
        let hour = usize::try_from(at.hour()).unwrap_or(usize::MAX);
        if let Some(slot) = self.hours.get_mut(hour) {
            *slot += 1;
        }
        let daily = self
            .daily_rules
            .entry(date)
            .or_default()
            .entry(rule_id.clone())
            .or_default();
        daily.name = rule_name.to_string();
        daily.count += 1;
    }

    #[must_use]
    pub fn day_total(&self, date: NaiveDate) -> u64 {
        self.day_totals.get(&date).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn rule_total(&self, rule_id: &RuleId) -> u64 {
        self.rule_totals.get(rule_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn hour_total(&self, hour: u8) -> u64 {
        self.hours.get(usize::from(hour)).copied().unwrap_or(0)
    }

    /// Flatten into the persisted key-value form.
    #[must_use]
    pub fn to_entries(&self) -> BTreeMap<String, serde_json::Value> {
        let mut out = BTreeMap::new();
        for (date, total) in &self.day_totals {
            out.insert(
                format!("today_{}", date.format(DATE_FORMAT)),
                serde_json::Value::from(*total),
            );
        }
        for (rule_id, total) in &self.rule_totals {
            out.insert(format!("rule_{rule_id}"), serde_json::Value::from(*total));
        }
        for (hour, total) in self.hours.iter().enumerate() {
            if *total > 0 {
                out.insert(format!("hour_{hour:02}"), serde_json::Value::from(*total));
            }
        }
        for (date, rules) in &self.daily_rules {
            let nested = rules
                .iter()
                .map(|(id, count)| {
                    (
                        id.to_string(),
                        serde_json::json!({"name": count.name, "count": count.count}),
                    )
                })
                .collect::<serde_json::Map<_, _>>();
            out.insert(
                format!("daily_{}", date.format(DATE_FORMAT)),
                serde_json::Value::Object(nested),
            );
        }
        out
    }

    /// Rebuild from the persisted key-value form, skipping unreadable keys.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, serde_json::Value)>) -> Self {
        let mut stats = Self::default();
        for (key, value) in entries {
            if let Some(date) = key.strip_prefix("today_").and_then(parse_date) {
                if let Some(total) = value.as_u64() {
                    stats.day_totals.insert(date, total);
                }
            } else if let Some(rule_id) = key.strip_prefix("rule_") {
                if let Some(total) = value.as_u64() {
                    stats.rule_totals.insert(RuleId::new(rule_id), total);
                }
            } else if let Some(hour) = key.strip_prefix("hour_") {
                let slot = hour.parse::<usize>().ok().and_then(|h| stats.hours.get_mut(h));
                if let (Some(slot), Some(total)) = (slot, value.as_u64()) {
                    *slot = total;
                }
            } else if let Some(date) = key.strip_prefix("daily_").and_then(parse_date) {
                if let Ok(rules) =
                    serde_json::from_value::<BTreeMap<RuleId, DailyRuleCount>>(value)
                {
                    stats.daily_rules.insert(date, rules);
                }
            }
        }
        stats
    }

    /// Summarize counters as of `today`.
    #[must_use]
    pub fn report(&self, today: NaiveDate) -> StatsReport {
        let mut per_rule: Vec<RuleCount> = self
            .rule_totals
            .iter()
            .map(|(rule_id, count)| RuleCount {
                rule_id: rule_id.clone(),
                name: self.latest_name(rule_id),
                count: *count,
            })
            .collect();
        per_rule.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.rule_id.cmp(&b.rule_id)));

        let hourly = (0u8..24)
            .filter_map(|hour| {
                let total = self.hour_total(hour);
                (total > 0).then_some((hour, total))
            })
            .collect();

        let last_7_days = (0..7)
            .rev()
            .map(|offset| {
                let date = today - TimeDelta::days(offset);
                DaySummary {
                    date,
                    total: self.day_total(date),
                    rules: self.daily_rules.get(&date).cloned().unwrap_or_default(),
                }
            })
            .collect();

        StatsReport {
            today,
            today_total: self.day_total(today),
            per_rule,
            hourly,
            last_7_days,
        }
    }

    fn latest_name(&self, rule_id: &RuleId) -> Option<String> {
        self.daily_rules
            .values()
            .rev()
            .find_map(|rules| rules.get(rule_id))
            .map(|count| count.name.clone())
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).ok()
}

/// Total firings of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCount {
    pub rule_id: RuleId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub count: u64,
}

/// Firings during one calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total: u64,
    pub rules: BTreeMap<RuleId, DailyRuleCount>,
}

/// Read model of [`UsageStats`] for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsReport {
    pub today: NaiveDate,
    pub today_total: u64,
    /// Most fired first.
    pub per_rule: Vec<RuleCount>,
    /// Only hours with at least one firing.
    pub hourly: BTreeMap<u8, u64>,
    /// Seven entries, oldest first, ending with `today`.
    pub last_7_days: Vec<DaySummary>,
}
