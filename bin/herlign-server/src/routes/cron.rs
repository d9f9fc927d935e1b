//! Scheduled maintenance, triggered by an external scheduler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use utoipa::{OpenApi, ToSchema};

use crate::entities::{AdminStore, SessionStore};
use crate::error::ServerError;
use crate::middleware::auth::bearer_token;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(cleanup), components(schemas(CleanupResponse)))]
pub struct CronApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/cron/cleanup", get(cleanup))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanupResponse {
    /// Expired chat sessions removed (their messages go with them).
    pub deleted: u64,
}

#[utoipa::path(
    get,
    path = "/api/cron/cleanup",
    tag = "cron",
    responses(
        (status = 200, description = "Expired sessions deleted", body = CleanupResponse),
        (status = 401, description = "Missing or wrong cron secret"),
    )
)]
pub async fn cleanup(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<CleanupResponse>, ServerError> {
    if let Some(secret) = state.config.cron_secret.as_deref() {
        if bearer_token(&headers) != Some(secret) {
            return Err(ServerError::unauthorized());
        }
    }

    let now = Utc::now();
    let deleted = state.store.delete_expired_sessions(now).await?;
    let tokens = state.store.delete_expired_tokens(now).await?;
    info!(deleted, expired_tokens = tokens, "cleanup finished");
    Ok(Json(CleanupResponse { deleted }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::config::Config;
    use crate::entities::session::test::session;
    use crate::entities::ChatStore;
    use crate::routes::test_support::{authed, body_json, get, send};
    use axum::http::StatusCode;
    use chrono::Duration;
    use herlign_core::SenderType;

    #[tokio::test]
    async fn removes_only_expired_sessions_and_their_messages() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let old = session("hash-old", Utc::now() - Duration::days(31), 30);
        let fresh = session("hash-new", Utc::now(), 30);
        state.store.create_session(&old).await.unwrap();
        state.store.create_session(&fresh).await.unwrap();
        state.store.append_message(&old.id, SenderType::Guest, "bye").await.unwrap();

        let response = send(&state, get("/api/cron/cleanup")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["deleted"], 1);

        assert!(state.store.get_session(&old.id).await.unwrap().is_none());
        assert!(state.store.list_messages(&old.id).await.unwrap().is_empty());
        assert!(state.store.get_session(&fresh.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn secret_is_enforced_when_configured() {
        let mut config = Config::for_tests();
        config.cron_secret = Some("s3cret".into());
        let state = AppState::for_tests_with(config, Arc::new(FakeCompletion::failing())).await;

        let response = send(&state, get("/api/cron/cleanup")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = send(&state, authed(get("/api/cron/cleanup"), "wrong")).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = send(&state, authed(get("/api/cron/cleanup"), "s3cret")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
