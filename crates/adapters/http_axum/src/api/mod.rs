//! JSON REST API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod engine;
#[allow(clippy::missing_errors_doc)]
pub mod events;
#[allow(clippy::missing_errors_doc)]
pub mod history;
#[allow(clippy::missing_errors_doc)]
pub mod rules;

use axum::Router;
use axum::routing::{get, post, put};
use serde::Deserialize;

use chime_app::ports::{AutomationControl, EventPublisher};

use crate::state::AppState;

/// Request body of the `.../enabled` endpoints.
#[derive(Debug, Deserialize)]
pub struct EnabledRequest {
    pub enabled: bool,
}

/// Build the `/api` sub-router.
pub fn routes<C, P>() -> Router<AppState<C, P>>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    Router::new()
        // Rules
        .route(
            "/rules",
            get(rules::list::<C, P>).put(rules::replace::<C, P>),
        )
        .route(
            "/rules/{id}",
            put(rules::upsert::<C, P>).delete(rules::delete::<C, P>),
        )
        .route("/rules/{id}/enabled", put(rules::set_enabled::<C, P>))
        .route(
            "/automation/enabled",
            put(rules::set_automation_enabled::<C, P>),
        )
        // Engine
        .route("/engine/status", get(engine::status::<C, P>))
        .route("/engine/reload", post(engine::reload::<C, P>))
        // History
        .route(
            "/logs",
            get(history::logs::<C, P>).delete(history::clear_logs::<C, P>),
        )
        .route(
            "/stats",
            get(history::stats::<C, P>).delete(history::clear_stats::<C, P>),
        )
        // Events
        .route("/events", post(events::inject::<C, P>))
}
