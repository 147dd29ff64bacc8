//! Unified error handling for the webhook handlers.
//!
//! Handlers return [`ApiResult`] and use `?` freely; [`ApiError`] maps each
//! failure class onto a status code and a JSON body carrying diagnostics.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::api::ErrorResponse;
use thiserror::Error;

use crate::clients::ClientError;

/// Unified error type for API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// An outbound call to a collaborator failed
    #[error(transparent)]
    Client(#[from] ClientError),

    /// Unexpected failure
    #[error("{0}")]
    Internal(#[from] anyhow::Error),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Missing or invalid request input
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// JSON parsing error
    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Environment variable missing
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    /// Create a config error for missing env vars
    pub fn missing_env(var_name: &str) -> Self {
        ApiError::Config(format!("{} environment variable must be set", var_name))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Client(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) | ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) | ApiError::JsonParse(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Error body without logging; shared by the JSON and HTML renderings.
    pub fn to_body(&self) -> ErrorResponse {
        let (error, details) = match self {
            ApiError::Client(ClientError::Upstream {
                service,
                status,
                body,
            }) => (
                format!("{} request failed with status {}", service, status),
                Some(body.clone()),
            ),
            ApiError::Client(e) => (e.to_string(), None),
            ApiError::Internal(e) => ("Internal server error".to_string(), Some(e.to_string())),
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => (msg.clone(), None),
            ApiError::JsonParse(e) => ("Invalid JSON format".to_string(), Some(e.to_string())),
            ApiError::Config(msg) => ("Server configuration error".to_string(), Some(msg.clone())),
        };
        ErrorResponse { error, details }
    }

    pub(crate) fn log(&self) {
        match self {
            ApiError::Client(e) => tracing::error!("Outbound call failed: {}", e),
            ApiError::Internal(e) => tracing::error!("Internal error: {:?}", e),
            ApiError::Config(msg) => tracing::error!("Configuration error: {}", msg),
            ApiError::JsonParse(e) => tracing::warn!("JSON parse error: {}", e),
            ApiError::BadRequest(msg) => tracing::warn!("Rejected request: {}", msg),
            ApiError::NotFound(msg) => tracing::debug!("Not found: {}", msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(self.to_body())).into_response()
    }
}

/// Result type alias for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_failure_keeps_body() {
        let err = ApiError::from(ClientError::Upstream {
            service: "downstream",
            status: 500,
            body: "boom".to_string(),
        });
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
        let body = err.to_body();
        assert_eq!(body.details.as_deref(), Some("boom"));
        assert!(body.error.contains("500"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::bad_request("x").status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::missing_env("AIRTABLE_API_KEY").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::from(anyhow::anyhow!("bad")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_missing_env_names_variable() {
        let body = ApiError::missing_env("HUBSPOT_ACCESS_TOKEN").to_body();
        assert_eq!(
            body.details.as_deref(),
            Some("HUBSPOT_ACCESS_TOKEN environment variable must be set")
        );
    }
}
