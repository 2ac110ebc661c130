//! Health reminders: sit, water and eye-rest nudges during working hours.
//!
//! Reuses the wake timer: each reminder arms `health:<kind>`, listens for
//! its own wake point on the event stream, notifies and re-arms.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;

use chime_domain::event::DeviceEvent;
use chime_domain::reminder::{ReminderKind, ReminderSettings};

use crate::ports::{Clock, Effects, EventSource, EventSubscription, Notification, WakeTimer};

struct Inner<T, F, E, C> {
    timer: T,
    effects: F,
    events: E,
    clock: C,
    settings: ReminderSettings,
    due: Mutex<HashMap<ReminderKind, NaiveDateTime>>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

/// Interval reminders with an explicit start/stop lifecycle.
pub struct HealthReminderService<T, F, E, C> {
    inner: Arc<Inner<T, F, E, C>>,
}

impl<T, F, E, C> Clone for HealthReminderService<T, F, E, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, F, E, C> HealthReminderService<T, F, E, C>
where
    T: WakeTimer + 'static,
    F: Effects + 'static,
    E: EventSource + 'static,
    C: Clock + 'static,
{
    pub fn new(timer: T, effects: F, events: E, clock: C, settings: ReminderSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                timer,
                effects,
                events,
                clock,
                settings,
                due: Mutex::new(HashMap::new()),
                listener: Mutex::new(None),
            }),
        }
    }

    /// Start listening and arm every enabled reminder. No-op when running.
    #[tracing::instrument(skip(self))]
    pub fn start_all(&self) {
        let mut listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if listener.is_some() {
            tracing::warn!("health reminders already running");
            return;
        }
        let events = self.inner.events.subscribe();
        *listener = Some(tokio::spawn(listen(Arc::clone(&self.inner), events)));
        drop(listener);

        let now = self.inner.clock.now();
        for kind in ReminderKind::ALL {
            if self.inner.settings.schedule(kind).enabled {
                self.inner.arm(kind, now);
            }
        }
    }

    /// Stop listening and cancel every reminder. No-op when stopped.
    #[tracing::instrument(skip(self))]
    pub fn stop_all(&self) {
        let listener = self
            .inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(listener) = listener else {
            return;
        };
        listener.abort();
        let armed: Vec<_> = self
            .inner
            .due
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (kind, _) in armed {
            self.inner.timer.cancel(&kind.wake_point());
        }
        tracing::info!("health reminders stopped");
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// When each armed reminder is due next.
    #[must_use]
    pub fn due(&self) -> HashMap<ReminderKind, NaiveDateTime> {
        self.inner
            .due
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<T, F, E, C> Inner<T, F, E, C>
where
    T: WakeTimer,
    F: Effects,
    C: Clock,
{
    fn arm(&self, kind: ReminderKind, from: NaiveDateTime) {
        let due = self.settings.next_fire(kind, from);
        match self.timer.arm(&kind.wake_point(), due) {
            Ok(()) => {
                tracing::debug!(%kind, %due, "health reminder armed");
                self.due
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(kind, due);
            }
            Err(err) => tracing::warn!(%err, %kind, "unable to arm health reminder"),
        }
    }

    async fn fire(&self, kind: ReminderKind, at: NaiveDateTime) {
        let expected = self
            .due
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .copied();
        if expected != Some(at) {
            tracing::debug!(%kind, %at, "ignoring stale health reminder");
            return;
        }
        let notification = Notification::new(kind.title(), kind.message());
        if let Err(err) = self.effects.notify(&notification).await {
            tracing::warn!(%err, %kind, "health reminder notification failed");
        }
        self.arm(kind, self.clock.now().max(at));
    }
}

async fn listen<T, F, E, C>(inner: Arc<Inner<T, F, E, C>>, mut events: EventSubscription)
where
    T: WakeTimer,
    F: Effects,
    C: Clock,
{
    while let Some(event) = events.recv().await {
        if let DeviceEvent::WakePoint { id, at } = event
            && let Some(kind) = ReminderKind::from_wake_point(&id)
        {
            inner.fire(kind, at).await;
        }
    }
}
