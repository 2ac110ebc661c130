//! Storage ports: persistence for the rule document and the execution history.

use std::future::Future;

use chime_domain::error::ChimeError;
use chime_domain::history::{ExecutionLog, UsageStats};
use chime_domain::rule::StoredRuleSet;

/// Persists the rule document as one unit.
pub trait RuleRepository: Send + Sync {
    /// Read the stored document, `None` when nothing was ever saved.
    fn load(&self) -> impl Future<Output = Result<Option<StoredRuleSet>, ChimeError>> + Send;

    /// Replace the stored document atomically.
    fn save(&self, rules: &StoredRuleSet) -> impl Future<Output = Result<(), ChimeError>> + Send;
}

/// Persists the execution log and the usage counters.
///
/// Each `replace_*` call swaps the whole blob in one write, so readers never
/// observe a partially cleared log or a half-written stats map.
pub trait HistoryRepository: Send + Sync {
    fn load_log(&self) -> impl Future<Output = Result<ExecutionLog, ChimeError>> + Send;

    fn replace_log(&self, log: &ExecutionLog)
    -> impl Future<Output = Result<(), ChimeError>> + Send;

    fn load_stats(&self) -> impl Future<Output = Result<UsageStats, ChimeError>> + Send;

    fn replace_stats(
        &self,
        stats: &UsageStats,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send;
}

impl<T: RuleRepository> RuleRepository for std::sync::Arc<T> {
    fn load(&self) -> impl Future<Output = Result<Option<StoredRuleSet>, ChimeError>> + Send {
        (**self).load()
    }

    fn save(&self, rules: &StoredRuleSet) -> impl Future<Output = Result<(), ChimeError>> + Send {
        (**self).save(rules)
    }
}

impl<T: HistoryRepository> HistoryRepository for std::sync::Arc<T> {
    fn load_log(&self) -> impl Future<Output = Result<ExecutionLog, ChimeError>> + Send {
        (**self).load_log()
    }

    fn replace_log(
        &self,
        log: &ExecutionLog,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send {
        (**self).replace_log(log)
    }

    fn load_stats(&self) -> impl Future<Output = Result<UsageStats, ChimeError>> + Send {
        (**self).load_stats()
    }

    fn replace_stats(
        &self,
        stats: &UsageStats,
    ) -> impl Future<Output = Result<(), ChimeError>> + Send {
        (**self).replace_stats(stats)
    }
}
