//! Simulated battery and power supply.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chime_app::event_bus::InProcessEventBus;
use chime_app::ports::{DeviceMonitor, EventPublisher, EventSource, EventSubscription};
use chime_domain::error::ChimeError;
use chime_domain::event::DeviceEvent;
use tokio::task::JoinHandle;

/// Snapshot of the simulated battery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryState {
    pub level: u8,
    pub plugged: bool,
}

impl BatteryState {
    /// One simulation tick: charge one percent while plugged, drain one otherwise.
    #[must_use]
    fn step(self) -> Self {
        let level = if self.plugged {
            self.level.saturating_add(1).min(100)
        } else {
            self.level.saturating_sub(1)
        };
        Self { level, ..self }
    }

    fn charging(self) -> bool {
        self.plugged && self.level < 100
    }
}

/// A device whose battery readings are driven by code instead of hardware.
///
/// Every change is published on the shared event bus, the same bus the wake
/// timer delivers onto, so subscribing here yields the complete event stream.
pub struct VirtualDevice {
    bus: Arc<InProcessEventBus>,
    state: Mutex<BatteryState>,
}

impl VirtualDevice {
    #[must_use]
    pub fn new(bus: Arc<InProcessEventBus>, level: u8, plugged: bool) -> Self {
        Self {
            bus,
            state: Mutex::new(BatteryState {
                level: level.min(100),
                plugged,
            }),
        }
    }

    #[must_use]
    pub fn state(&self) -> BatteryState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(
        &self,
        change: impl FnOnce(BatteryState) -> BatteryState,
    ) -> (BatteryState, BatteryState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let before = *state;
        *state = change(before);
        (before, *state)
    }

    /// Set the battery level and publish the new sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the event bus rejects the event.
    pub async fn set_level(&self, level: u8) -> Result<(), ChimeError> {
        let (_, after) = self.update(|state| BatteryState {
            level: level.min(100),
            ..state
        });
        self.publish_battery(after).await
    }

    /// Plug or unplug the charger.
    ///
    /// Publishes a power transition when the state actually changes, followed
    /// by a battery sample carrying the new charging flag.
    ///
    /// # Errors
    ///
    /// Returns an error if the event bus rejects an event.
    pub async fn set_plugged(&self, plugged: bool) -> Result<(), ChimeError> {
        let (before, after) = self.update(|state| BatteryState { plugged, ..state });
        if before.plugged == after.plugged {
            return Ok(());
        }
        tracing::info!(plugged, "power state changed");
        self.bus.publish(DeviceEvent::Power { plugged }).await?;
        self.publish_battery(after).await
    }

    /// Advance the simulation by one tick, publishing only when the level moved.
    ///
    /// # Errors
    ///
    /// Returns an error if the event bus rejects the event.
    pub async fn tick(&self) -> Result<(), ChimeError> {
        let (before, after) = self.update(BatteryState::step);
        if before.level == after.level {
            return Ok(());
        }
        self.publish_battery(after).await
    }

    /// Run [`Self::tick`] every `interval` until the returned task is aborted.
    pub fn spawn_simulation(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let device = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = device.tick().await {
                    tracing::warn!(%err, "battery simulation tick failed");
                }
            }
        })
    }

    async fn publish_battery(&self, state: BatteryState) -> Result<(), ChimeError> {
        tracing::debug!(level = state.level, charging = state.charging(), "battery sample");
        self.bus
            .publish(DeviceEvent::battery(state.level, state.charging()))
            .await
    }
}

/// Publishing through the device keeps its simulated state in step with the
/// event: an injected battery sample or power transition becomes the new
/// reading before it is forwarded to the bus unchanged.
impl EventPublisher for VirtualDevice {
    async fn publish(&self, event: DeviceEvent) -> Result<(), ChimeError> {
        match event {
            DeviceEvent::Battery { level, charging } => {
                self.update(|state| BatteryState {
                    level: level.min(100),
                    plugged: charging || (state.plugged && level >= 100),
                });
            }
            DeviceEvent::Power { plugged } => {
                self.update(|state| BatteryState { plugged, ..state });
            }
            DeviceEvent::WakePoint { .. } => {}
        }
        self.bus.publish(event).await
    }
}

impl EventSource for VirtualDevice {
    fn subscribe(&self) -> EventSubscription {
        self.bus.subscribe()
    }
}

impl DeviceMonitor for VirtualDevice {
    fn battery_level(&self) -> Option<u8> {
        Some(self.state().level)
    }

    fn is_charging(&self) -> bool {
        self.state().charging()
    }
}
