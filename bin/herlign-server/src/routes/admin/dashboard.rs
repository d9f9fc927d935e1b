use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{Duration, Utc};
use utoipa::OpenApi;

use crate::entities::DashboardStore;
use crate::error::ServerError;
use crate::schemas::dashboard::{DashboardStats, Tally};
use crate::schemas::DataResponse;
use crate::state::AppState;

/// Chats count as active when their last message is this recent.
const ACTIVE_CHAT_WINDOW_HOURS: i64 = 24;

#[derive(OpenApi)]
#[openapi(paths(get_dashboard), components(schemas(DashboardStats, Tally)))]
pub struct DashboardApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/dashboard", get(get_dashboard))
}

#[utoipa::path(
    get,
    path = "/api/admin/dashboard",
    tag = "admin-dashboard",
    security(("bearer" = [])),
    responses((status = 200, description = "Content totals", body = DataResponse<DashboardStats>))
)]
pub async fn get_dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<DashboardStats>>, ServerError> {
    let since = Utc::now() - Duration::hours(ACTIVE_CHAT_WINDOW_HOURS);
    let stats = state.store.dashboard_stats(since).await?;
    Ok(Json(DataResponse::new("Dashboard stats retrieved successfully", stats)))
}
