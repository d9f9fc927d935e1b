use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use tracing::debug;

use crate::entities::AdminStore;
use crate::error::ServerError;
use crate::state::AppState;

/// Token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Guards `/api/admin/*`: the bearer token must belong to an admin and be
/// unexpired. On success the [`AdminUser`](crate::entities::dao::AdminUser)
/// is available to handlers as an extension.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let token = bearer_token(req.headers()).ok_or_else(ServerError::unauthorized)?;
    let admin = state
        .store
        .find_admin_by_token(token, Utc::now())
        .await?
        .ok_or_else(|| {
            debug!("rejected unknown or expired admin token");
            ServerError::unauthorized()
        })?;
    req.extensions_mut().insert(admin);
    Ok(next.run(req).await)
}
