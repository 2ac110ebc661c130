//! # chime-domain
//!
//! Pure domain model for the chime automation engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, clock times
//! - Define **Rules** (trigger → action bindings) and their validation
//! - Define **Device events** (battery samples, power transitions, wake points)
//! - Daily wake-point arithmetic and health-reminder scheduling
//! - Execution history: the capped log and the usage counters
//! - Weather alert evaluation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod event;
pub mod history;
pub mod reminder;
pub mod rule;
pub mod schedule;
pub mod weather;
