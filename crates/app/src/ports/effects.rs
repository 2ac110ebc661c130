//! Effects port: the side effects a rule can request.

use std::future::Future;

/// A notification to display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Stable identifier: showing a notification with the same id replaces
    /// the previous one instead of stacking a new one.
    pub id: u32,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// Notification whose id is derived from its title.
    #[must_use]
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            id: stable_id(&title),
            title,
            message: message.into(),
        }
    }

    /// Use `key` instead of the title to derive the id.
    #[must_use]
    pub fn keyed(mut self, key: &str) -> Self {
        self.id = stable_id(key);
        self
    }
}

/// 32-bit FNV-1a, stable across runs.
fn stable_id(key: &str) -> u32 {
    key.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// A requested effect could not be carried out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EffectError {
    #[error("{collaborator} is unavailable")]
    Unavailable { collaborator: &'static str },
    #[error("launch target {target:?} not found")]
    TargetNotFound { target: String },
    #[error("effect rejected: {reason}")]
    Rejected { reason: String },
}

/// Speech output, notifications and app launching, supplied by the host platform.
pub trait Effects: Send + Sync {
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), EffectError>> + Send;

    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), EffectError>> + Send;

    fn launch(&self, target: &str) -> impl Future<Output = Result<(), EffectError>> + Send;
}

impl<T: Effects> Effects for std::sync::Arc<T> {
    fn speak(&self, text: &str) -> impl Future<Output = Result<(), EffectError>> + Send {
        (**self).speak(text)
    }

    fn notify(
        &self,
        notification: &Notification,
    ) -> impl Future<Output = Result<(), EffectError>> + Send {
        (**self).notify(notification)
    }

    fn launch(&self, target: &str) -> impl Future<Output = Result<(), EffectError>> + Send {
        (**self).launch(target)
    }
}
