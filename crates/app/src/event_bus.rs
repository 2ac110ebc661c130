//! In-process event bus with one unbounded queue per subscriber.

use std::future::Future;
use std::sync::{Mutex, PoisonError};

use tokio::sync::mpsc;

use chime_domain::error::ChimeError;
use chime_domain::event::DeviceEvent;

use crate::ports::{EventPublisher, EventSource, EventSubscription};

/// In-process event bus.
///
/// Each subscriber owns an unbounded queue, so a slow subscriber delays only
/// itself and never loses events. Subscribers that dropped their receiver
/// are pruned on the next publish. Publishing succeeds even when nobody
/// listens (the event is simply discarded).
#[derive(Default)]
pub struct InProcessEventBus {
    subscribers: Mutex<Vec<mpsc::UnboundedSender<DeviceEvent>>>,
}

impl InProcessEventBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }

    fn broadcast(&self, event: &DeviceEvent) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl EventSource for InProcessEventBus {
    fn subscribe(&self) -> EventSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }
}

impl EventPublisher for InProcessEventBus {
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), ChimeError>> + Send {
        tracing::trace!(%event, "publishing device event");
        self.broadcast(&event);
        async { Ok(()) }
    }
}
