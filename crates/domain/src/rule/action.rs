//! Action: the effect a rule requests when it fires.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Something to do when a rule fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    /// Say something out loud. A `template` takes precedence over `text`.
    Speak {
        #[serde(
            default,
            deserialize_with = "non_empty",
            skip_serializing_if = "Option::is_none"
        )]
        text: Option<String>,
        #[serde(
            default,
            deserialize_with = "non_empty",
            skip_serializing_if = "Option::is_none"
        )]
        template: Option<String>,
    },
    /// Show a notification.
    Notify {
        title: String,
        #[serde(
            default,
            deserialize_with = "non_empty",
            skip_serializing_if = "Option::is_none"
        )]
        message: Option<String>,
    },
    /// Open an application by its opaque identifier.
    Launch {
        #[serde(alias = "package")]
        target: String,
    },
    /// An action type this version does not know about. Does nothing.
    #[serde(other)]
    Unknown,
}

/// Kind of an [`Action`], as recorded in the execution log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Speak,
    Notify,
    Launch,
    Unknown,
}

impl Action {
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Speak { .. } => ActionKind::Speak,
            Self::Notify { .. } => ActionKind::Notify,
            Self::Launch { .. } => ActionKind::Launch,
            Self::Unknown => ActionKind::Unknown,
        }
    }

    /// Text a `Speak` action would say, or `None` when there is nothing to say.
    ///
    /// An unknown template resolves to `None`; it does not fall back to `text`.
    #[must_use]
    pub fn spoken_text(&self) -> Option<&str> {
        match self {
            Self::Speak {
                template: Some(template),
                ..
            } => speech_template(template),
            Self::Speak {
                text: Some(text), ..
            } => Some(text.as_str()),
            _ => None,
        }
    }

    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyNotifyTitle`] or
    /// [`ValidationError::EmptyLaunchTarget`] for blank required fields.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Notify { title, .. } if title.trim().is_empty() => {
                Err(ValidationError::EmptyNotifyTitle)
            }
            Self::Launch { target } if target.trim().is_empty() => {
                Err(ValidationError::EmptyLaunchTarget)
            }
            _ => Ok(()),
        }
    }
}

/// Canned speech for a template id.
#[must_use]
pub fn speech_template(id: &str) -> Option<&'static str> {
    match id {
        "weather_commute" => Some("早上好！今天天气不错，适合出行。通勤路上请注意安全。"),
        "tomorrow_weather" => Some("明天天气晴朗，温度适宜，适合安排户外活动。"),
        "news_brief" => Some("正在为您播报最新资讯..."),
        _ => None,
    }
}

fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Speak => f.write_str("speak"),
            Self::Notify => f.write_str("notify"),
            Self::Launch => f.write_str("launch"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
