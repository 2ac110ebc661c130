//! Wake timer port: one-shot timers keyed by [`WakePointId`].

use chrono::NaiveDateTime;

use chime_domain::id::WakePointId;

/// A wake point could not be armed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("no timer runtime is available")]
    NoRuntime,
    #[error("wake point rejected: {reason}")]
    Rejected { reason: String },
}

/// Arms and cancels one-shot wake points.
///
/// When an armed wake point elapses the implementation delivers a
/// [`DeviceEvent::WakePoint`](chime_domain::event::DeviceEvent::WakePoint)
/// carrying the same id and the scheduled time.
pub trait WakeTimer: Send + Sync {
    /// Arm `id` to fire at local time `at`, replacing any previous arm of `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`SchedulerError`] when the wake point cannot be armed.
    fn arm(&self, id: &WakePointId, at: NaiveDateTime) -> Result<(), SchedulerError>;

    /// Cancel `id`; cancelling an unknown id is a no-op.
    fn cancel(&self, id: &WakePointId);
}

impl<T: WakeTimer> WakeTimer for std::sync::Arc<T> {
    fn arm(&self, id: &WakePointId, at: NaiveDateTime) -> Result<(), SchedulerError> {
        (**self).arm(id, at)
    }

    fn cancel(&self, id: &WakePointId) {
        (**self).cancel(id);
    }
}
