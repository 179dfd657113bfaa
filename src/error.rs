use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

/// Errors raised by the upstream clients
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("Invalid upstream response: {0}")]
    InvalidResponse(String),
}

pub type AppResult<T> = Result<T, AppError>;

pub const VALIDATION_FAILED: &str = "Request validation failed";
pub const GENERIC_FAILURE: &str = "An unexpected error occurred. Please try again later.";

/// Errors returned to HTTP clients as `{ error, details, message }` envelopes
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    /// One or more required fields were absent; the upstream was never called
    #[error("{message}")]
    MissingFields {
        message: &'static str,
        fields: Vec<&'static str>,
    },

    /// The body or query string could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The delegated upstream call failed
    #[error("{context}: {source}")]
    Upstream {
        context: &'static str,
        #[source]
        source: AppError,
    },
}

impl ApiError {
    pub fn missing(message: &'static str, fields: Vec<&'static str>) -> Self {
        ApiError::MissingFields { message, fields }
    }

    /// Adapter for `map_err` that tags an upstream failure with a route-specific message
    pub fn upstream(context: &'static str) -> impl FnOnce(AppError) -> ApiError {
        move |source| ApiError::Upstream { context, source }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::MissingFields { message, fields } => {
                tracing::warn!(missing = ?fields, "Rejected request with missing fields");
                (
                    StatusCode::BAD_REQUEST,
                    json!({
                        "error": message,
                        "details": { "missingFields": fields },
                        "message": VALIDATION_FAILED,
                    }),
                )
            }
            ApiError::InvalidRequest(details) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "Invalid request",
                    "details": details,
                    "message": VALIDATION_FAILED,
                }),
            ),
            ApiError::Upstream { context, source } => {
                tracing::error!(error = %source, "{}", context);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": context,
                        "details": source.to_string(),
                        "message": GENERIC_FAILURE,
                        "timestamp": Utc::now().to_rfc3339(),
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_fields_is_bad_request() {
        let response =
            ApiError::missing("Cultural profile is required", vec!["culturalProfile"])
                .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Cultural profile is required");
        assert_eq!(body["details"]["missingFields"][0], "culturalProfile");
        assert_eq!(body["message"], VALIDATION_FAILED);
        assert!(body.get("timestamp").is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_carries_source_message() {
        let error = ApiError::upstream("Failed to fetch recommendations")(AppError::ExternalApi(
            "Qloo API returned status 503".to_string(),
        ));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["error"], "Failed to fetch recommendations");
        assert!(body["details"]
            .as_str()
            .unwrap()
            .contains("Qloo API returned status 503"));
        assert_eq!(body["message"], GENERIC_FAILURE);
        assert!(chrono::DateTime::parse_from_rfc3339(body["timestamp"].as_str().unwrap()).is_ok());
    }

    #[test]
    fn test_app_error_display() {
        let error = AppError::InvalidResponse("no choices".to_string());
        assert_eq!(error.to_string(), "Invalid upstream response: no choices");
    }
}
