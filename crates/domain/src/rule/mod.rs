//! Rule: a named binding of triggers to actions.
//!
//! A [`Rule`] fires when *any* of its triggers matches an incoming event of
//! the same kind; there is no conjunction across trigger kinds. When it
//! fires, its [`Action`]s run in order.
//!
//! Rules are persisted as a [`StoredRuleSet`]: the top-level `enabled` flag
//! plus raw JSON records, so that one unreadable record never hides the
//! others. [`StoredRuleSet::decode`] turns it into a validated [`RuleSet`].

mod action;
mod defaults;
mod trigger;

pub use action::{Action, ActionKind, speech_template};
pub use defaults::default_rules;
pub use trigger::{PowerState, Trigger, TriggerKind};

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ChimeError, MalformedRule, ValidationError};
use crate::id::RuleId;
use crate::time::ClockTime;

fn enabled_by_default() -> bool {
    true
}

/// A trigger → action binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    pub id: RuleId,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub triggers: Vec<Trigger>,
    pub actions: Vec<Action>,
}

impl Rule {
    /// Create a builder for constructing a [`Rule`].
    #[must_use]
    pub fn builder() -> RuleBuilder {
        RuleBuilder::default()
    }

    /// Parse and validate one persisted rule record.
    ///
    /// # Errors
    ///
    /// Returns [`MalformedRule::Structure`] when required fields are missing
    /// or have the wrong shape (including a badly formatted `time`), and
    /// [`MalformedRule::Invalid`] when [`Rule::validate`] rejects the result.
    pub fn from_value(value: serde_json::Value) -> Result<Self, MalformedRule> {
        let rule: Self = serde_json::from_value(value)?;
        rule.check()?;
        Ok(rule)
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Validation`] when:
    /// - `id` is blank ([`ValidationError::EmptyId`])
    /// - `name` is blank ([`ValidationError::EmptyName`])
    /// - `triggers` is empty ([`ValidationError::NoTriggers`])
    /// - `actions` is empty ([`ValidationError::NoActions`])
    /// - a trigger or action carries an out-of-range value
    pub fn validate(&self) -> Result<(), ChimeError> {
        self.check().map_err(ChimeError::from)
    }

    fn check(&self) -> Result<(), ValidationError> {
        if self.id.is_blank() {
            return Err(ValidationError::EmptyId);
        }
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.triggers.is_empty() {
            return Err(ValidationError::NoTriggers);
        }
        if self.actions.is_empty() {
            return Err(ValidationError::NoActions);
        }
        self.triggers.iter().try_for_each(Trigger::validate)?;
        self.actions.iter().try_for_each(Action::validate)
    }

    /// `true` iff some time trigger fires at `time` on `weekday` (0 = Sunday).
    #[must_use]
    pub fn matches_time(&self, time: ClockTime, weekday: u8) -> bool {
        self.triggers.iter().any(|t| t.matches_time(time, weekday))
    }

    /// `true` iff some battery trigger accepts `level`.
    ///
    /// `charging` is accepted for symmetry with the device sample but does
    /// not restrict the match.
    #[must_use]
    pub fn matches_battery(&self, level: u8, _charging: bool) -> bool {
        self.triggers.iter().any(|t| t.matches_battery(level))
    }

    /// `true` iff some power trigger waits for this transition direction.
    #[must_use]
    pub fn matches_power(&self, plugged: bool) -> bool {
        self.triggers.iter().any(|t| t.matches_power(plugged))
    }

    /// Position and time of day of every time trigger.
    pub fn time_triggers(&self) -> impl Iterator<Item = (usize, ClockTime)> + '_ {
        self.triggers
            .iter()
            .enumerate()
            .filter_map(|(index, trigger)| match trigger {
                Trigger::Time { time, .. } => Some((index, *time)),
                _ => None,
            })
    }
}

/// Step-by-step builder for [`Rule`].
#[derive(Debug, Default)]
pub struct RuleBuilder {
    id: Option<RuleId>,
    name: Option<String>,
    enabled: Option<bool>,
    triggers: Vec<Trigger>,
    actions: Vec<Action>,
}

impl RuleBuilder {
    #[must_use]
    pub fn id(mut self, id: impl Into<RuleId>) -> Self {
        self.id = Some(id.into());
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn trigger(mut self, trigger: Trigger) -> Self {
        self.triggers.push(trigger);
        self
    }

    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Consume the builder, validate, and return a [`Rule`].
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Validation`] if required fields are missing or empty.
    pub fn build(self) -> Result<Rule, ChimeError> {
        let rule = Rule {
            id: self.id.unwrap_or_else(|| RuleId::new("")),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            triggers: self.triggers,
            actions: self.actions,
        };
        rule.validate()?;
        Ok(rule)
    }
}

/// A validated rule document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Master switch for the whole engine.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    pub rules: Vec<Rule>,
}

impl RuleSet {
    /// Rules that are individually enabled.
    pub fn enabled_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|rule| rule.enabled)
    }

    /// Check every rule and reject duplicate ids.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found, wrapped in [`ChimeError`].
    pub fn validate(&self) -> Result<(), ChimeError> {
        let mut seen = HashSet::new();
        for rule in &self.rules {
            rule.validate()?;
            if !seen.insert(&rule.id) {
                return Err(ValidationError::DuplicateRuleId(rule.id.to_string()).into());
            }
        }
        Ok(())
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: default_rules(),
        }
    }
}

/// A record that [`StoredRuleSet::decode`] had to drop.
#[derive(Debug)]
pub struct DroppedRule {
    /// Position in the stored `rules` array.
    pub index: usize,
    /// The record's `id`, when it had a readable one.
    pub id: Option<String>,
    pub reason: MalformedRule,
}

/// The persisted shape of a rule document: `{enabled, rules: [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRuleSet {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub rules: Vec<serde_json::Value>,
}

impl StoredRuleSet {
    /// Serialize a validated rule set for storage.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if a rule cannot be represented as JSON.
    pub fn encode(set: &RuleSet) -> Result<Self, serde_json::Error> {
        let rules = set
            .rules
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            enabled: set.enabled,
            rules,
        })
    }

    /// Parse every record, keeping the valid ones in order.
    ///
    /// Malformed records and later duplicates of an already kept id are
    /// returned separately instead of failing the whole document.
    #[must_use]
    pub fn decode(self) -> (RuleSet, Vec<DroppedRule>) {
        let mut rules: Vec<Rule> = Vec::with_capacity(self.rules.len());
        let mut dropped = Vec::new();
        for (index, value) in self.rules.into_iter().enumerate() {
            let id = value
                .get("id")
                .and_then(serde_json::Value::as_str)
                .map(str::to_string);
            match Rule::from_value(value) {
                Ok(rule) if rules.iter().any(|kept| kept.id == rule.id) => {
                    dropped.push(DroppedRule {
                        index,
                        id,
                        reason: MalformedRule::Invalid(ValidationError::DuplicateRuleId(
                            rule.id.to_string(),
                        )),
                    });
                }
                Ok(rule) => rules.push(rule),
                Err(reason) => dropped.push(DroppedRule { index, id, reason }),
            }
        }
        (
            RuleSet {
                enabled: self.enabled,
                rules,
            },
            dropped,
        )
    }

    /// Mutable access to the raw record whose `id` equals `id`.
    pub fn record_mut(&mut self, id: &RuleId) -> Option<&mut serde_json::Value> {
        self.rules.iter_mut().find(|value| {
            value.get("id").and_then(serde_json::Value::as_str) == Some(id.as_str())
        })
    }
}
