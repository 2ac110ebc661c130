//! Execution log & stats: records rule firings for diagnostics and display.

use tokio::sync::Mutex;

use chime_domain::error::ChimeError;
use chime_domain::history::{ExecutionLog, LogEntry, StatsReport, UsageStats};
use chime_domain::id::RuleId;
use chime_domain::rule::{ActionKind, Rule, TriggerKind};

use crate::ports::{Clock, HistoryRepository};

/// Application service for the execution log and usage counters.
///
/// Read-modify-write cycles are serialized so concurrent recorders never
/// lose each other's entries.
pub struct ExecutionLogService<H, C> {
    repo: H,
    clock: C,
    write: Mutex<()>,
}

impl<H: HistoryRepository, C: Clock> ExecutionLogService<H, C> {
    pub fn new(repo: H, clock: C) -> Self {
        Self {
            repo,
            clock,
            write: Mutex::new(()),
        }
    }

    /// Record that `rule` fired because of a trigger of `kind`.
    ///
    /// Appends a log entry and counts the firing in the usage stats.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn record_trigger(&self, rule: &Rule, kind: TriggerKind) -> Result<(), ChimeError> {
        let _write = self.write.lock().await;
        let entry = LogEntry::trigger(
            self.clock.timestamp(),
            rule.id.clone(),
            rule.name.clone(),
            kind,
        );
        self.append(entry).await?;

        let mut stats = self.repo.load_stats().await?;
        stats.record(&rule.id, &rule.name, self.clock.now());
        self.repo.replace_stats(&stats).await
    }

    /// Record something noteworthy about one action of a rule.
    ///
    /// Only the log is touched: stats count firings, not actions.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self, details))]
    pub async fn record_action(
        &self,
        rule_id: &RuleId,
        kind: ActionKind,
        details: impl Into<String>,
    ) -> Result<(), ChimeError> {
        let _write = self.write.lock().await;
        let entry = LogEntry::action(self.clock.timestamp(), rule_id.clone(), kind, details);
        self.append(entry).await
    }

    /// Log entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn logs(&self) -> Result<Vec<LogEntry>, ChimeError> {
        Ok(self.repo.load_log().await?.into())
    }

    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn clear_logs(&self) -> Result<(), ChimeError> {
        let _write = self.write.lock().await;
        self.repo.replace_log(&ExecutionLog::default()).await
    }

    /// Summary of the counters as of today.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    pub async fn stats(&self) -> Result<StatsReport, ChimeError> {
        let stats = self.repo.load_stats().await?;
        Ok(stats.report(self.clock.now().date()))
    }

    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn clear_stats(&self) -> Result<(), ChimeError> {
        let _write = self.write.lock().await;
        self.repo.replace_stats(&UsageStats::default()).await
    }

    async fn append(&self, entry: LogEntry) -> Result<(), ChimeError> {
        let mut log = self.repo.load_log().await?;
        log.push(entry);
        self.repo.replace_log(&log).await
    }
}
