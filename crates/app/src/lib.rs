//! # chime-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `RuleRepository`: load & save the rule document
//!   - `HistoryRepository`: execution log & usage statistics
//!   - `Effects`: speak, notify, launch
//!   - `WakeTimer` / `WakeLock`: wake points and the busy guard's lock
//!   - `DeviceMonitor` / `WeatherSource`: battery, power and weather readings
//! - Define the **driving/inbound port** `AutomationControl`, implemented by
//!   [`automation_engine::AutomationEngine`]
//! - Provide **in-process infrastructure** (event bus, tokio wake timer) that
//!   doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `chime-domain` only (plus `tokio` for channels and timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod automation_engine;
pub mod busy_guard;
pub mod event_bus;
pub mod ports;
pub mod services;
pub mod wake_timer;

#[cfg(test)]
mod testing;
