//! # chime-adapter-virtual
//!
//! Virtual host that stands in for the platform collaborators, for local runs,
//! tests and demonstration purposes.
//!
//! ## Provided collaborators
//!
//! | Type | Port | Behaviour |
//! |------|------|-----------|
//! | [`VirtualDevice`] | `DeviceMonitor` | Simulated battery that drains or charges on a tick, power plug transitions |
//! | [`ConsoleEffects`] | `Effects` | Speech and notifications go to the log; launches resolve against an allow-list |
//! | [`VirtualWakeLock`] | `WakeLock` | Held flag that releases itself once its timeout elapses |
//! | [`StaticWeatherSource`] | `WeatherSource` | Returns a configured sample, or reports itself unavailable |
//!
//! ## Dependency rule
//!
//! Depends on `chime-app` (port traits) and `chime-domain` only.

mod device;
mod effects;
mod wake_lock;
mod weather;

pub use device::{BatteryState, VirtualDevice};
pub use effects::{ConsoleEffects, EffectRecord};
pub use wake_lock::VirtualWakeLock;
pub use weather::StaticWeatherSource;
