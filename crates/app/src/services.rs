//! Application services: use-case implementations.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod action_executor;
pub mod execution_log;
pub mod health_reminders;
pub mod rule_store;
pub mod wake_scheduler;
pub mod weather_alerts;
