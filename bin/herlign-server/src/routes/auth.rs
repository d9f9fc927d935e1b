//! Admin login, logout and session status.
//!
//! Tokens are opaque uuids stored in `admin_tokens`; the
//! [`require_admin`](crate::middleware::auth::require_admin) middleware
//! resolves them on every `/api/admin/*` request.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use herlign_core::identity::verify_password;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::{db_time, AdminStore};
use crate::error::ServerError;
use crate::extract::ValidJson;
use crate::middleware::auth::bearer_token;
use crate::middleware::rate_limit;
use crate::schemas::auth::{LoginRequest, LoginResponse, SessionStatusResponse};
use crate::schemas::MessageResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(login, logout, session_status),
    components(schemas(LoginRequest, LoginResponse, SessionStatusResponse, MessageResponse))
)]
pub struct AuthApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", post(logout))
        .route("/auth/session", get(session_status))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many login attempts"),
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<ValidJson<LoginRequest>, ServerError>,
) -> Result<Json<LoginResponse>, ServerError> {
    rate_limit::enforce(
        &state.rate_limiter,
        &headers,
        "auth",
        &state.config.rate_limits.auth,
        "Too many login attempts",
    )?;
    let ValidJson(req) = body?;

    let admin = state
        .store
        .find_admin_by_email(&req.email)
        .await?
        .filter(|a| verify_password(&req.password, &a.password_hash))
        .ok_or_else(|| {
            warn!("failed admin login");
            ServerError::Unauthorized("Invalid credentials".into())
        })?;

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::hours(state.config.admin_token_ttl_hours);
    state.store.insert_token(&token, &admin.id, expires_at).await?;
    info!(admin_id = %admin.id, "admin logged in");

    Ok(Json(LoginResponse {
        message: "Login successful".into(),
        token,
        expires_at: db_time(expires_at),
        user: admin.user(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Token revoked", body = MessageResponse),
        (status = 401, description = "No bearer token"),
    )
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<MessageResponse>, ServerError> {
    let token = bearer_token(&headers).ok_or_else(ServerError::unauthorized)?;
    state.store.revoke_token(token).await?;
    Ok(Json(MessageResponse::new("Logout successful")))
}

/// Never fails with 401; an unknown or missing token reports
/// `authenticated: false`.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    tag = "auth",
    responses(
        (status = 200, description = "Authentication status", body = SessionStatusResponse),
    )
)]
pub async fn session_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<SessionStatusResponse> {
    let user = match bearer_token(&headers) {
        Some(token) => match state.store.find_admin_by_token(token, Utc::now()).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                None
            }
        },
        None => None,
    };
    Json(SessionStatusResponse {
        authenticated: user.is_some(),
        user,
    })
}
