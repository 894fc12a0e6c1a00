//! HTTP error response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use tidyhub_domain::error::TidyHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`TidyHubError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(TidyHubError);

impl From<TidyHubError> for ApiError {
    fn from(err: TidyHubError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            TidyHubError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            TidyHubError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            TidyHubError::Actuation(err) => {
                tracing::warn!(error = %err, "actuation failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
            TidyHubError::Batch(err) => {
                tracing::warn!(error = %err, "batch failed");
                (StatusCode::BAD_GATEWAY, err.to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidyhub_domain::error::{ActuationError, NotFoundError, ValidationError};

    #[test]
    fn should_map_each_error_kind_to_status() {
        let cases = [
            (
                TidyHubError::from(ValidationError::EmptyLocation),
                StatusCode::BAD_REQUEST,
            ),
            (
                TidyHubError::from(NotFoundError {
                    entity: "Location",
                    id: "garage".to_string(),
                }),
                StatusCode::NOT_FOUND,
            ),
            (
                TidyHubError::from(ActuationError::Timeout),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).into_response().status(), status);
        }
    }
}
