//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use chime_domain::error::{ChimeError, MalformedRule};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`ChimeError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Domain(ChimeError),
    /// The request body has the wrong shape.
    BadRequest(String),
}

impl From<ChimeError> for ApiError {
    fn from(err: ChimeError) -> Self {
        Self::Domain(err)
    }
}

impl From<MalformedRule> for ApiError {
    fn from(err: MalformedRule) -> Self {
        match err {
            MalformedRule::Structure(err) => Self::BadRequest(err.to_string()),
            MalformedRule::Invalid(err) => Self::Domain(ChimeError::Validation(err)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Self::Domain(ChimeError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(ChimeError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(ChimeError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chime_domain::error::{NotFoundError, ValidationError};

    #[test]
    fn should_map_validation_to_bad_request() {
        let response = ApiError::from(ChimeError::from(ValidationError::EmptyName)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn should_map_not_found_to_404() {
        let response = ApiError::from(ChimeError::from(NotFoundError {
            entity: "Rule",
            id: "nope".to_string(),
        }))
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn should_hide_storage_details_behind_500() {
        let response = ApiError::from(ChimeError::Storage("disk full".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn should_map_malformed_structure_to_bad_request() {
        let err = serde_json::from_str::<u8>("\"x\"").unwrap_err();
        let response = ApiError::from(MalformedRule::Structure(err)).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
