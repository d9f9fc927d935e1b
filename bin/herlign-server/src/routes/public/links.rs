use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::dao::Link;
use crate::entities::LinkStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::routes::PUBLIC_CACHE;
use crate::schemas::link::LinkQuery;
use crate::schemas::ListResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_public_links), components(schemas(Link)))]
pub struct PublicLinkApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/links", get(list_public_links))
}

#[utoipa::path(
    get,
    path = "/api/links",
    tag = "links",
    params(LinkQuery),
    responses(
        (status = 200, description = "Links, newest first", body = ListResponse<Link>),
        (status = 400, description = "Invalid query parameters"),
    )
)]
pub async fn list_public_links(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<LinkQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let category = q.category.as_deref().filter(|c| !c.trim().is_empty());
    let (links, total) = state.store.list_links(category, page).await?;
    Ok((PUBLIC_CACHE, Json(ListResponse::new(links, page.paginate(total)))))
}
