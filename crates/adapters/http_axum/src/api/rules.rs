//! JSON REST handlers for the rule document.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use chime_app::ports::{AutomationControl, EventPublisher};
use chime_domain::id::RuleId;
use chime_domain::rule::{Rule, RuleSet};

use crate::api::EnabledRequest;
use crate::error::ApiError;
use crate::state::AppState;

/// Possible responses from the list endpoint.
pub enum ListResponse {
    Ok(Json<RuleSet>),
}

impl IntoResponse for ListResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from the upsert endpoint.
pub enum UpsertResponse {
    Ok(Json<Rule>),
}

impl IntoResponse for UpsertResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Ok(json) => json.into_response(),
        }
    }
}

/// Possible responses from endpoints that return nothing.
pub enum EmptyResponse {
    NoContent,
}

impl IntoResponse for EmptyResponse {
    fn into_response(self) -> Response {
        match self {
            Self::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// `GET /api/rules`: the current rule document.
pub async fn list<C, P>(State(state): State<AppState<C, P>>) -> ListResponse
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    ListResponse::Ok(Json(state.control.rules().await))
}

/// `PUT /api/rules`: replace the whole rule document.
pub async fn replace<C, P>(
    State(state): State<AppState<C, P>>,
    Json(rules): Json<RuleSet>,
) -> Result<ListResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state.control.replace_rules(rules.clone()).await?;
    Ok(ListResponse::Ok(Json(rules)))
}

/// `PUT /api/rules/{id}`: create or replace one rule.
///
/// The id from the path wins over any id in the body.
pub async fn upsert<C, P>(
    State(state): State<AppState<C, P>>,
    Path(id): Path<String>,
    Json(mut body): Json<serde_json::Value>,
) -> Result<UpsertResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    let Some(fields) = body.as_object_mut() else {
        return Err(ApiError::BadRequest("a rule must be a JSON object".to_string()));
    };
    fields.insert("id".to_string(), serde_json::Value::String(id));
    let rule = Rule::from_value(body)?;
    state.control.upsert_rule(rule.clone()).await?;
    Ok(UpsertResponse::Ok(Json(rule)))
}

/// `DELETE /api/rules/{id}`: remove one rule.
pub async fn delete<C, P>(
    State(state): State<AppState<C, P>>,
    Path(id): Path<String>,
) -> Result<EmptyResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state.control.delete_rule(RuleId::new(id)).await?;
    Ok(EmptyResponse::NoContent)
}

/// `PUT /api/rules/{id}/enabled`: toggle one rule.
pub async fn set_enabled<C, P>(
    State(state): State<AppState<C, P>>,
    Path(id): Path<String>,
    Json(req): Json<EnabledRequest>,
) -> Result<EmptyResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state
        .control
        .set_rule_enabled(RuleId::new(id), req.enabled)
        .await?;
    Ok(EmptyResponse::NoContent)
}

/// `PUT /api/automation/enabled`: master switch.
pub async fn set_automation_enabled<C, P>(
    State(state): State<AppState<C, P>>,
    Json(req): Json<EnabledRequest>,
) -> Result<EmptyResponse, ApiError>
where
    C: AutomationControl,
    P: EventPublisher + 'static,
{
    state.control.set_automation_enabled(req.enabled).await?;
    Ok(EmptyResponse::NoContent)
}
