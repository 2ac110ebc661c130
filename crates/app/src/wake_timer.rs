//! Tokio-backed wake timer delivering wake points onto an event publisher.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;

use chime_domain::event::DeviceEvent;
use chime_domain::id::WakePointId;

use crate::ports::{Clock, EventPublisher, SchedulerError, WakeTimer};

type Pending = Arc<Mutex<HashMap<WakePointId, (u64, JoinHandle<()>)>>>;

/// Longest uninterrupted sleep before the wall clock is read again.
const MAX_SLEEP: Duration = Duration::from_secs(60);

/// One sleeping tokio task per armed wake point.
///
/// The task sleeps in slices of at most [`MAX_SLEEP`] and re-reads the clock
/// after each one, so a wall-clock or time zone change while armed moves the
/// firing with it. It publishes [`DeviceEvent::WakePoint`] once the clock
/// reaches the scheduled time. Re-arming an id aborts the previous task.
pub struct TokioWakeTimer<P, C> {
    publisher: Arc<P>,
    clock: Arc<C>,
    pending: Pending,
    sequence: AtomicU64,
}

impl<P, C> TokioWakeTimer<P, C>
where
    P: EventPublisher + 'static,
    C: Clock + 'static,
{
    #[must_use]
    pub fn new(publisher: Arc<P>, clock: C) -> Self {
        Self {
            publisher,
            clock: Arc::new(clock),
            pending: Arc::default(),
            sequence: AtomicU64::new(0),
        }
    }

    /// Ids currently waiting to fire.
    #[must_use]
    pub fn pending(&self) -> Vec<WakePointId> {
        let mut ids: Vec<_> = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        ids.sort();
        ids
    }
}

fn remaining<C: Clock>(clock: &C, at: NaiveDateTime) -> Duration {
    (at - clock.now()).to_std().unwrap_or_default()
}

impl<P, C> WakeTimer for TokioWakeTimer<P, C>
where
    P: EventPublisher + 'static,
    C: Clock + 'static,
{
    fn arm(&self, id: &WakePointId, at: NaiveDateTime) -> Result<(), SchedulerError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;
        let delay = remaining(self.clock.as_ref(), at);
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);

        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        let task = {
            let id = id.clone();
            let publisher = Arc::clone(&self.publisher);
            let registry = Arc::clone(&self.pending);
            let clock = Arc::clone(&self.clock);
            runtime.spawn(async move {
                loop {
                    let left = remaining(clock.as_ref(), at);
                    if left.is_zero() {
                        break;
                    }
                    tokio::time::sleep(left.min(MAX_SLEEP)).await;
                }
                {
                    let mut pending = registry.lock().unwrap_or_else(PoisonError::into_inner);
                    if pending.get(&id).is_some_and(|(current, _)| *current == seq) {
                        pending.remove(&id);
                    }
                }
                tracing::debug!(wake_point = %id, %at, "wake point elapsed");
                if let Err(err) = publisher.publish(DeviceEvent::WakePoint { id, at }).await {
                    tracing::warn!(%err, "failed to deliver wake point");
                }
            })
        };
        if let Some((_, previous)) = pending.insert(id.clone(), (seq, task)) {
            previous.abort();
        }
        tracing::debug!(wake_point = %id, %at, delay_secs = delay.as_secs(), "wake point armed");
        Ok(())
    }

    fn cancel(&self, id: &WakePointId) {
        let removed = self
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some((_, task)) = removed {
            task.abort();
            tracing::debug!(wake_point = %id, "wake point cancelled");
        }
    }
}

impl<P, C> Drop for TokioWakeTimer<P, C> {
    fn drop(&mut self) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, (_, task)) in pending.drain() {
            task.abort();
        }
    }
}
