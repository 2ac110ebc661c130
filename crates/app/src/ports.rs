//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the use-case layer and the
//! adapter layer can depend on them without creating circular dependencies.

pub mod clock;
pub mod control;
pub mod device;
pub mod effects;
pub mod event_bus;
pub mod storage;
pub mod wake_lock;
pub mod wake_timer;
pub mod weather;

pub use clock::{Clock, SystemClock};
pub use control::{AutomationControl, EngineStatus};
pub use device::DeviceMonitor;
pub use effects::{EffectError, Effects, Notification};
pub use event_bus::{EventPublisher, EventSource, EventSubscription};
pub use storage::{HistoryRepository, RuleRepository};
pub use wake_lock::WakeLock;
pub use wake_timer::{SchedulerError, WakeTimer};
pub use weather::{WeatherError, WeatherSource};
