//! Typed identifier newtypes backed by stable strings.
//!
//! Rule ids are chosen by whoever writes the rule document (`"bedtime"`,
//! `"low_battery"`, ...), so they are kept verbatim rather than generated.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Borrow the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` when the identifier is empty or whitespace only.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a [`Rule`](crate::rule::Rule).
    RuleId
);

define_id!(
    /// Key of an armed wake point; arming the same key twice replaces the first.
    WakePointId
);

impl WakePointId {
    /// Wake point for the `index`-th trigger of a rule.
    #[must_use]
    pub fn for_rule_trigger(rule_id: &RuleId, index: usize) -> Self {
        Self(format!("rule:{rule_id}:{index}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_derive_wake_point_from_rule_and_trigger_index() {
        let id = WakePointId::for_rule_trigger(&RuleId::new("bedtime"), 1);
        assert_eq!(id.as_str(), "rule:bedtime:1");
    }

    #[test]
    fn should_serialize_as_plain_string() {
        let json = serde_json::to_string(&RuleId::new("morning_routine")).unwrap();
        assert_eq!(json, "\"morning_routine\"");
    }

    #[test]
    fn should_detect_blank_identifier() {
        assert!(RuleId::new("  ").is_blank());
        assert!(!RuleId::new("a").is_blank());
    }
}
