//! Rule store: loads, validates and edits the persisted rule document.

use chime_domain::error::{ChimeError, NotFoundError};
use chime_domain::id::RuleId;
use chime_domain::rule::{Rule, RuleSet, StoredRuleSet};

use crate::ports::RuleRepository;

/// Application service owning the canonical rule document.
pub struct RuleStore<R> {
    repo: R,
}

fn storage(err: serde_json::Error) -> ChimeError {
    ChimeError::Storage(Box::new(err))
}

fn rule_not_found(id: &RuleId) -> ChimeError {
    NotFoundError {
        entity: "Rule",
        id: id.to_string(),
    }
    .into()
}

impl<R: RuleRepository> RuleStore<R> {
    /// Create a new store backed by the given repository.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Load the rule document. Never fails.
    ///
    /// - Malformed records are dropped with a warning; the rest still load.
    /// - When nothing was ever stored, the default rules are seeded and saved.
    /// - When storage cannot be read, the default rules are used for this
    ///   load only.
    #[tracing::instrument(skip(self))]
    pub async fn load(&self) -> RuleSet {
        match self.repo.load().await {
            Ok(Some(stored)) => {
                let (set, dropped) = stored.decode();
                for rule in &dropped {
                    tracing::warn!(
                        index = rule.index,
                        rule_id = rule.id.as_deref().unwrap_or("<unknown>"),
                        reason = %rule.reason,
                        "dropping malformed rule"
                    );
                }
                set
            }
            Ok(None) => {
                let defaults = RuleSet::default();
                tracing::info!(rules = defaults.rules.len(), "seeding default rules");
                if let Err(err) = self.persist(&defaults).await {
                    tracing::warn!(%err, "unable to persist default rules");
                }
                defaults
            }
            Err(err) => {
                tracing::warn!(%err, "unable to read rules, falling back to defaults");
                RuleSet::default()
            }
        }
    }

    /// Validate and persist a whole rule document.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Validation`] if any rule is invalid (nothing is
    /// written in that case), or a storage error from the repository.
    #[tracing::instrument(skip(self, rules), fields(rules = rules.rules.len()))]
    pub async fn save(&self, rules: &RuleSet) -> Result<(), ChimeError> {
        rules.validate()?;
        self.persist(rules).await
    }

    /// Whether a raw rule record would load.
    #[must_use]
    pub fn validate(raw: &serde_json::Value) -> bool {
        Rule::from_value(raw.clone()).is_ok()
    }

    /// Flip the `enabled` flag of one rule, leaving every other record untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::NotFound`] when no record has this id, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_rule_enabled(&self, id: &RuleId, enabled: bool) -> Result<(), ChimeError> {
        let mut stored = self.stored().await?;
        let record = stored
            .record_mut(id)
            .and_then(serde_json::Value::as_object_mut)
            .ok_or_else(|| rule_not_found(id))?;
        record.insert("enabled".to_string(), serde_json::Value::Bool(enabled));
        self.repo.save(&stored).await
    }

    /// Flip the master switch.
    ///
    /// # Errors
    ///
    /// Returns a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn set_automation_enabled(&self, enabled: bool) -> Result<(), ChimeError> {
        let mut stored = self.stored().await?;
        stored.enabled = enabled;
        self.repo.save(&stored).await
    }

    /// Insert a rule, or replace the record with the same id in place.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::Validation`] if the rule is invalid, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self, rule), fields(rule_id = %rule.id))]
    pub async fn upsert_rule(&self, rule: &Rule) -> Result<(), ChimeError> {
        rule.validate()?;
        let value = serde_json::to_value(rule).map_err(storage)?;
        let mut stored = self.stored().await?;
        match stored.record_mut(&rule.id) {
            Some(record) => *record = value,
            None => stored.rules.push(value),
        }
        self.repo.save(&stored).await
    }

    /// Remove every record with this id.
    ///
    /// # Errors
    ///
    /// Returns [`ChimeError::NotFound`] when no record has this id, or a
    /// storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_rule(&self, id: &RuleId) -> Result<(), ChimeError> {
        let mut stored = self.stored().await?;
        let before = stored.rules.len();
        stored.rules.retain(|record| {
            record.get("id").and_then(serde_json::Value::as_str) != Some(id.as_str())
        });
        if stored.rules.len() == before {
            return Err(rule_not_found(id));
        }
        self.repo.save(&stored).await
    }

    /// The raw stored document, or the defaults when nothing was saved yet.
    async fn stored(&self) -> Result<StoredRuleSet, ChimeError> {
        match self.repo.load().await? {
            Some(stored) => Ok(stored),
            None => StoredRuleSet::encode(&RuleSet::default()).map_err(storage),
        }
    }

    async fn persist(&self, rules: &RuleSet) -> Result<(), ChimeError> {
        let stored = StoredRuleSet::encode(rules).map_err(storage)?;
        self.repo.save(&stored).await
    }
}
