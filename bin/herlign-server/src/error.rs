//! Unified server error type.
//!
//! Every handler returns `Result<T, ServerError>`, which implements
//! [`axum::response::IntoResponse`] so errors become JSON bodies with the
//! status codes the site frontend expects.
//!
//! Database and internal failures are logged with full detail; the caller
//! only ever sees `"Internal server error"`.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::youtube::YouTubeError;

#[derive(Debug, Error)]
pub enum ServerError {
    /// Body or query failed to parse or validate.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials. Carries the client-facing message.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("too many requests: {message}")]
    TooManyRequests { message: String, reset_in: u64 },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An upstream dependency is not set up. Carries the client-facing message.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    /// An upstream call failed. Carries the client-facing message.
    #[error("bad gateway: {0}")]
    BadGateway(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn unauthorized() -> Self {
        ServerError::Unauthorized("Unauthorized".into())
    }
}

impl From<herlign_core::CoreError> for ServerError {
    fn from(e: herlign_core::CoreError) -> Self {
        ServerError::BadRequest(e.to_string())
    }
}

impl From<YouTubeError> for ServerError {
    fn from(e: YouTubeError) -> Self {
        match e {
            YouTubeError::NotConfigured => ServerError::ServiceUnavailable(e.to_string()),
            YouTubeError::NoUploadsPlaylist => ServerError::BadGateway(e.to_string()),
            other => {
                error!(error = %other, "YouTube request failed");
                ServerError::BadGateway("Failed to fetch videos from YouTube".into())
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Validation(details) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Validation failed", "details": details })),
            )
                .into_response(),
            ServerError::BadRequest(m) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
            }
            ServerError::Unauthorized(m) => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": m }))).into_response()
            }
            ServerError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": m, "data": null })),
            )
                .into_response(),
            ServerError::TooManyRequests { message, reset_in } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({ "error": message, "resetIn": reset_in })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from(reset_in));
                response
            }
            ServerError::ServiceUnavailable(m) => {
                (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": m }))).into_response()
            }
            ServerError::BadGateway(m) => {
                (StatusCode::BAD_GATEWAY, Json(json!({ "error": m }))).into_response()
            }
            ServerError::Database(e) => {
                error!(error = %e, "database error");
                internal()
            }
            ServerError::Internal(m) => {
                error!(message = %m, "internal server error");
                internal()
            }
        }
    }
}

fn internal() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Internal server error" })),
    )
        .into_response()
}

impl From<anyhow::Error> for ServerError {
    fn from(e: anyhow::Error) -> Self {
        error!(error = ?e, "converting anyhow error to ServerError::Internal");
        ServerError::Internal(e.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn too_many_requests_sets_retry_after() {
        let response = ServerError::TooManyRequests {
            message: "Too many messages".into(),
            reset_in: 42,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "42");
        let body = body_json(response).await;
        assert_eq!(body["resetIn"], 42);
    }

    #[tokio::test]
    async fn not_found_uses_message_envelope() {
        let response = ServerError::NotFound("Event not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Event not found");
        assert!(body["data"].is_null());
    }

    #[tokio::test]
    async fn internal_errors_are_opaque() {
        let response = ServerError::Internal("disk on fire at /var/db".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn youtube_failures_hide_upstream_detail() {
        let response = ServerError::from(YouTubeError::NotConfigured).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["error"], "YouTube API key or channel ID not configured");

        let upstream = YouTubeError::Status {
            endpoint: "videos",
            status: StatusCode::FORBIDDEN,
        };
        let response = ServerError::from(upstream).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(response).await["error"], "Failed to fetch videos from YouTube");
    }

    #[tokio::test]
    async fn validation_carries_details() {
        let response = ServerError::Validation("message: length".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Validation failed");
        assert_eq!(body["details"], "message: length");
    }
}
