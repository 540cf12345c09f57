// crates/lootforge-service/src/error.rs
// ============================================================================
// Module: Service Error
// Description: Maps every fallible path in a handler to an HTTP response.
// Purpose: One error type per handler return, rendered as a JSON problem
//   body with a status code matching its failure class.
// Dependencies: axum, serde_json, thiserror
// ============================================================================

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::response::Response;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Type
// ============================================================================

/// Failure surfaced to an HTTP caller.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request body failed to decode or referenced an unknown tool.
    #[error("bad_request: {0}")]
    BadRequest(String),
    /// A stage's own validation or contract check rejected the input.
    #[error("unprocessable: {0}")]
    Unprocessable(String),
    /// An unexpected internal failure, e.g. a panic-free I/O error.
    #[error("internal: {0}")]
    Internal(String),
}

/// JSON body shape for every error response.
#[derive(Debug, Serialize)]
struct ErrorBody {
    /// Stable machine-readable error class.
    error: &'static str,
    /// Human-readable detail.
    message: String,
}

impl ServiceError {
    /// Returns this error's HTTP status code.
    const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns this error's stable machine-readable class.
    const fn class(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Unprocessable(_) => "unprocessable",
            Self::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let class = self.class();
        let message = self.to_string();
        (status, Json(ErrorBody { error: class, message })).into_response()
    }
}

/// Result alias for fallible handlers.
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::ServiceError;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn bad_request_maps_to_400() {
        let response = ServiceError::BadRequest("no such tool".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn unprocessable_maps_to_422() {
        let response = ServiceError::Unprocessable("manifest invalid".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
