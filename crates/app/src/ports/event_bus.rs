//! Event bus ports: publishing and subscribing to device events.

use std::future::Future;

use chime_domain::error::ChimeError;
use chime_domain::event::DeviceEvent;
use tokio::sync::mpsc;

/// Receiving end of a subscription; dropping it unsubscribes.
pub type EventSubscription = mpsc::UnboundedReceiver<DeviceEvent>;

/// Publishes device events to interested subscribers.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to all current subscribers.
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), ChimeError>> + Send;
}

/// Hands out independent event subscriptions.
pub trait EventSource: Send + Sync {
    /// Events published after this call, in publication order.
    fn subscribe(&self) -> EventSubscription;
}

impl<T: EventPublisher> EventPublisher for std::sync::Arc<T> {
    fn publish(&self, event: DeviceEvent) -> impl Future<Output = Result<(), ChimeError>> + Send {
        (**self).publish(event)
    }
}

impl<T: EventSource> EventSource for std::sync::Arc<T> {
    fn subscribe(&self) -> EventSubscription {
        (**self).subscribe()
    }
}
