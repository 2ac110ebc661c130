//! Console effects: speech and notifications are written to the log.

use std::sync::{Mutex, PoisonError};

use chime_app::ports::{EffectError, Effects, Notification};

/// One effect that was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EffectRecord {
    Spoke(String),
    Notified(Notification),
    Launched(String),
}

/// [`Effects`] for a host without speaker or notification shade.
///
/// Launch targets resolve against a fixed allow-list of installed
/// applications. Every successful effect is kept in a journal.
pub struct ConsoleEffects {
    installed: Vec<String>,
    speech_enabled: bool,
    journal: Mutex<Vec<EffectRecord>>,
}

impl ConsoleEffects {
    #[must_use]
    pub fn new(installed: Vec<String>) -> Self {
        Self {
            installed,
            speech_enabled: true,
            journal: Mutex::new(Vec::new()),
        }
    }

    /// Report the speech engine as unavailable, like a host without TTS.
    #[must_use]
    pub fn without_speech(mut self) -> Self {
        self.speech_enabled = false;
        self
    }

    /// Everything performed so far, oldest first.
    #[must_use]
    pub fn journal(&self) -> Vec<EffectRecord> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, record: EffectRecord) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}

impl Effects for ConsoleEffects {
    async fn speak(&self, text: &str) -> Result<(), EffectError> {
        if !self.speech_enabled {
            return Err(EffectError::Unavailable {
                collaborator: "speech engine",
            });
        }
        tracing::info!(text, "speak");
        self.record(EffectRecord::Spoke(text.to_string()));
        Ok(())
    }

    async fn notify(&self, notification: &Notification) -> Result<(), EffectError> {
        tracing::info!(
            id = notification.id,
            title = %notification.title,
            message = %notification.message,
            "notification"
        );
        self.record(EffectRecord::Notified(notification.clone()));
        Ok(())
    }

    async fn launch(&self, target: &str) -> Result<(), EffectError> {
        if !self.installed.iter().any(|installed| installed == target) {
            return Err(EffectError::TargetNotFound {
                target: target.to_string(),
            });
        }
        tracing::info!(target, "launch");
        self.record(EffectRecord::Launched(target.to_string()));
        Ok(())
    }
}
