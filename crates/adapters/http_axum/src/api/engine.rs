//! JSON REST handlers for the engine lifecycle.

use axum::Json;
use axum::extract::State;

use chime_app::ports::{AutomationControl, EngineStatus, EventPublisher};

use crate::state::AppState;

/// `GET /api/engine/status`: running flag, armed wake points, last readings.
pub async fn status<C, P>(State(state): State<AppState<C, P>>) -> Json<EngineStatus>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    Json(state.control.status().await)
}

/// `POST /api/engine/reload`: restart the engine with the stored rules.
pub async fn reload<C, P>(State(state): State<AppState<C, P>>) -> Json<EngineStatus>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    tracing::info!("reload requested");
    state.control.reload().await;
    Json(state.control.status().await)
}
