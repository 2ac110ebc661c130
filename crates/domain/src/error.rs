//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`ChimeError`]
//! via `#[from]` (no `String` catch-all variants).

/// Top-level error shared by the domain, the application layer and adapters.
#[derive(Debug, thiserror::Error)]
pub enum ChimeError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("identifier must not be empty")]
    EmptyId,
    #[error("name must not be empty")]
    EmptyName,
    #[error("a rule needs at least one trigger")]
    NoTriggers,
    #[error("a rule needs at least one action")]
    NoActions,
    #[error("invalid clock time {0:?}, expected HH:MM")]
    InvalidTime(String),
    #[error("invalid weekday {0}, expected 0 (Sunday) to 6 (Saturday)")]
    InvalidWeekday(u8),
    #[error("invalid battery threshold {0}, expected 0 to 100")]
    InvalidBatteryLevel(u8),
    #[error("notification title must not be empty")]
    EmptyNotifyTitle,
    #[error("launch target must not be empty")]
    EmptyLaunchTarget,
    #[error("rule id {0:?} is used more than once")]
    DuplicateRuleId(String),
}

/// A looked-up item does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id:?} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// A persisted rule record that cannot become a valid [`Rule`](crate::rule::Rule).
#[derive(Debug, thiserror::Error)]
pub enum MalformedRule {
    #[error("unreadable rule record: {0}")]
    Structure(#[from] serde_json::Error),
    #[error("invalid rule: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<MalformedRule> for ChimeError {
    fn from(err: MalformedRule) -> Self {
        match err {
            MalformedRule::Invalid(inner) => Self::Validation(inner),
            MalformedRule::Structure(inner) => Self::Storage(Box::new(inner)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_into_chime_error() {
        let err: ChimeError = ValidationError::NoActions.into();
        assert!(matches!(
            err,
            ChimeError::Validation(ValidationError::NoActions)
        ));
    }

    #[test]
    fn should_render_not_found_message() {
        let err = NotFoundError {
            entity: "Rule",
            id: "bedtime".to_string(),
        };
        assert_eq!(err.to_string(), "Rule \"bedtime\" not found");
    }

    #[test]
    fn should_map_invalid_malformed_rule_to_validation() {
        let err: ChimeError = MalformedRule::Invalid(ValidationError::NoTriggers).into();
        assert!(matches!(
            err,
            ChimeError::Validation(ValidationError::NoTriggers)
        ));
    }
}
