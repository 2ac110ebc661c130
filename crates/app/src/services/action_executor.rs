//! Action executor: turns an [`Action`] into a call on the effects port.

use chime_domain::rule::Action;

use crate::ports::{EffectError, Effects, Notification};

/// What happened to an action that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The effect was handed to the collaborator.
    Performed,
    /// Nothing to do, e.g. a speech action without resolvable text.
    Skipped(&'static str),
}

pub struct ActionExecutor<F> {
    effects: F,
}

impl<F: Effects> ActionExecutor<F> {
    pub fn new(effects: F) -> Self {
        Self { effects }
    }

    /// Execute one action.
    ///
    /// # Errors
    ///
    /// Returns the [`EffectError`] reported by the collaborator. Callers are
    /// expected to log it and carry on with the next action.
    #[tracing::instrument(skip(self), fields(kind = %action.kind()))]
    pub async fn execute(&self, action: &Action) -> Result<ActionOutcome, EffectError> {
        match action {
            Action::Speak { .. } => match action.spoken_text() {
                Some(text) => {
                    self.effects.speak(text).await?;
                    Ok(ActionOutcome::Performed)
                }
                None => Ok(ActionOutcome::Skipped("no resolvable speech text")),
            },
            Action::Notify { title, message } => {
                let notification =
                    Notification::new(title.clone(), message.clone().unwrap_or_default());
                self.effects.notify(&notification).await?;
                Ok(ActionOutcome::Performed)
            }
            Action::Launch { target } => {
                self.effects.launch(target).await?;
                Ok(ActionOutcome::Performed)
            }
            Action::Unknown => Ok(ActionOutcome::Skipped("unknown action type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Effect, RecordingEffects};

    fn executor(effects: RecordingEffects) -> ActionExecutor<RecordingEffects> {
        ActionExecutor::new(effects)
    }

    #[tokio::test]
    async fn should_speak_resolved_template() {
        let executor = executor(RecordingEffects::default());
        let action = Action::Speak {
            text: None,
            template: Some("weather_commute".to_string()),
        };

        let outcome = executor.execute(&action).await.unwrap();

        assert_eq!(outcome, ActionOutcome::Performed);
        assert_eq!(
            executor.effects.effects(),
            vec![Effect::Speak(
                "早上好！今天天气不错，适合出行。通勤路上请注意安全。".to_string()
            )]
        );
    }

    #[tokio::test]
    async fn should_skip_silently_when_template_unknown() {
        let executor = executor(RecordingEffects::default());
        let action = Action::Speak {
            text: Some("fallback".to_string()),
            template: Some("horoscope".to_string()),
        };

        let outcome = executor.execute(&action).await.unwrap();

        assert!(matches!(outcome, ActionOutcome::Skipped(_)));
        assert!(executor.effects.effects().is_empty());
    }

    #[tokio::test]
    async fn should_notify_with_empty_message_by_default() {
        let executor = executor(RecordingEffects::default());
        let action = Action::Notify {
            title: "电量低".to_string(),
            message: None,
        };

        executor.execute(&action).await.unwrap();

        assert_eq!(
            executor.effects.notifications(),
            vec![Notification::new("电量低", "")]
        );
    }

    #[tokio::test]
    async fn should_report_missing_launch_target() {
        let executor = executor(RecordingEffects::default());
        let action = Action::Launch {
            target: "com.example.gone".to_string(),
        };

        let result = executor.execute(&action).await;

        assert_eq!(
            result,
            Err(EffectError::TargetNotFound {
                target: "com.example.gone".to_string()
            })
        );
    }

    #[tokio::test]
    async fn should_launch_installed_target() {
        let executor = executor(RecordingEffects {
            installed: vec!["com.example.music".to_string()],
            ..RecordingEffects::default()
        });
        let action = Action::Launch {
            target: "com.example.music".to_string(),
        };

        assert_eq!(
            executor.execute(&action).await,
            Ok(ActionOutcome::Performed)
        );
    }

    #[tokio::test]
    async fn should_report_unavailable_speech_engine() {
        let executor = executor(RecordingEffects {
            speech_unavailable: true,
            ..RecordingEffects::default()
        });
        let action = Action::Speak {
            text: Some("hi".to_string()),
            template: None,
        };

        assert!(matches!(
            executor.execute(&action).await,
            Err(EffectError::Unavailable { .. })
        ));
    }

    #[tokio::test]
    async fn should_skip_unknown_action() {
        let executor = executor(RecordingEffects::default());
        assert!(matches!(
            executor.execute(&Action::Unknown).await,
            Ok(ActionOutcome::Skipped(_))
        ));
    }
}
