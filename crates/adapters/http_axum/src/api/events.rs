//! Device event injection.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use chime_app::ports::{AutomationControl, EventPublisher};
use chime_domain::event::DeviceEvent;

use crate::error::ApiError;
use crate::state::AppState;

/// `POST /api/events`: publish a device event as if the host had sent it.
///
/// Battery levels above 100 are rejected.
pub async fn inject<C, P>(
    State(state): State<AppState<C, P>>,
    Json(event): Json<DeviceEvent>,
) -> Result<StatusCode, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    if let DeviceEvent::Battery { level, .. } = event
        && level > 100
    {
        return Err(ApiError::BadRequest(format!(
            "battery level {level} is outside 0..=100"
        )));
    }
    tracing::info!(%event, "injecting device event");
    state.events.publish(event).await?;
    Ok(StatusCode::ACCEPTED)
}
