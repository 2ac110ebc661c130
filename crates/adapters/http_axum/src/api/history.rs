//! JSON REST handlers for the execution log and usage statistics.

use axum::Json;
use axum::extract::State;

use chime_app::ports::{AutomationControl, EventPublisher};
use chime_domain::history::{LogEntry, StatsReport};

use crate::api::rules::EmptyResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// `GET /api/logs`: newest first.
pub async fn logs<C, P>(
    State(state): State<AppState<C, P>>,
) -> Result<Json<Vec<LogEntry>>, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    Ok(Json(state.control.logs().await?))
}

/// `DELETE /api/logs`
pub async fn clear_logs<C, P>(
    State(state): State<AppState<C, P>>,
) -> Result<EmptyResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state.control.clear_logs().await?;
    Ok(EmptyResponse::NoContent)
}

/// `GET /api/stats`
pub async fn stats<C, P>(
    State(state): State<AppState<C, P>>,
) -> Result<Json<StatsReport>, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    Ok(Json(state.control.stats().await?))
}

/// `DELETE /api/stats`
pub async fn clear_stats<C, P>(
    State(state): State<AppState<C, P>>,
) -> Result<EmptyResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state.control.clear_stats().await?;
    Ok(EmptyResponse::NoContent)
}
