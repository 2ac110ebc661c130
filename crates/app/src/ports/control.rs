//! Control port: what an operator surface (HTTP, CLI, UI) can do with a
//! running automation engine.

use std::future::Future;

use serde::Serialize;

use chime_domain::error::ChimeError;
use chime_domain::history::{LogEntry, StatsReport};
use chime_domain::id::RuleId;
use chime_domain::rule::{Rule, RuleSet};

use crate::services::wake_scheduler::ArmedWakePoint;

/// Snapshot of the engine for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    /// Rules loaded into the running engine (enabled ones only).
    pub active_rules: usize,
    pub wake_points: Vec<ArmedWakePoint>,
    pub battery_level: Option<u8>,
    pub charging: Option<bool>,
    pub plugged: Option<bool>,
    /// Whether a rule is executing right now.
    pub busy: bool,
}

/// Operations exposed to operator surfaces.
///
/// Every mutation of the rule document reloads the engine.
pub trait AutomationControl: Send + Sync + 'static {
    fn status(&self) -> impl Future<Output = EngineStatus> + Send;

    fn reload(&self) -> impl Future<Output = ()> + Send;

    fn rules(&self) -> impl Future<Output = RuleSet> + Send;

    fn replace_rules(&self, rules: RuleSet)
    -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn upsert_rule(&self, rule: Rule) -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn delete_rule(&self, id: RuleId) -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn set_rule_enabled(
        &self,
        id: RuleId,
        enabled: bool,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn set_automation_enabled(
        &self,
        enabled: bool,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn logs(&self) -> impl Future<Output = Result<Vec<LogEntry>, ChimeError>> + Send;

    fn clear_logs(&self) -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn stats(&self) -> impl Future<Output = Result<StatsReport, ChimeError>> + Send;

    fn clear_stats(&self) -> impl Future<Output = Result<(), ChimeError>> + Send;
}
