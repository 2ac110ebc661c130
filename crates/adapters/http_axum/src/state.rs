//! Shared application state for axum handlers.

use std::sync::Arc;

use chime_app::ports::{AutomationControl, EventPublisher};

/// Application state shared across all axum handlers.
///
/// Generic over the engine control and the event publisher to avoid dynamic
/// dispatch. `Clone` is implemented manually so the underlying types
/// themselves do not need to be `Clone`: only the `Arc` wrappers are cloned.
pub struct AppState<C, P> {
    /// The automation engine.
    pub control: Arc<C>,
    /// Bus that injected device events are published on.
    pub events: Arc<P>,
}

impl<C, P> Clone for AppState<C, P> {
    fn clone(&self) -> Self {
        Self {
            control: Arc::clone(&self.control),
            events: Arc::clone(&self.events),
        }
    }
}

impl<C, P> AppState<C, P>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    /// Create a new application state from owned collaborators.
    pub fn new(control: C, events: P) -> Self {
        Self::from_arcs(Arc::new(control), Arc::new(events))
    }

    /// Create a new application state from pre-wrapped `Arc`s.
    ///
    /// Use this when the engine and the bus are shared with background tasks.
    pub fn from_arcs(control: Arc<C>, events: Arc<P>) -> Self {
        Self { control, events }
    }
}
