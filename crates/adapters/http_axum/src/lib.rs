//! # chime-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a small **JSON control API** for the automation engine
//!   (`/api/rules`, `/api/engine/status`, `/api/logs`, `/api/stats`, …)
//! - Map HTTP requests onto the `AutomationControl` port (driving adapter)
//! - Let an operator inject device events (`POST /api/events`) for testing
//!   rules without real hardware
//!
//! ## Dependency rule
//! Depends on `chime-app` (for port traits) and `chime-domain` (for domain
//! types used in request/response mapping). Never leaks axum types into the
//! domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
