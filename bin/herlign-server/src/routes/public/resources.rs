use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::dao::Resource;
use crate::entities::resource::ResourceFilter;
use crate::entities::{parse_tag_list, ResourceStore};
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::routes::PUBLIC_CACHE;
use crate::schemas::resource::ResourceQuery;
use crate::schemas::ListResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_public_resources), components(schemas(Resource)))]
pub struct PublicResourceApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/resources", get(list_public_resources))
}

/// Builds the store filter and the echoed `filters` map from one query.
pub(crate) fn resource_filter(q: &ResourceQuery) -> ResourceFilter {
    ResourceFilter {
        format: q.format,
        category: q.category.clone().filter(|c| !c.trim().is_empty()),
        tags: parse_tag_list(q.tags.as_deref()),
        search: q.search.clone().filter(|s| !s.trim().is_empty()),
    }
}

pub(crate) fn resource_list(
    resources: Vec<Resource>,
    total: i64,
    page: herlign_core::PageParams,
    q: &ResourceQuery,
) -> ListResponse<Resource> {
    let message = format!("Successfully retrieved {} resource(s)", resources.len());
    ListResponse::new(resources, page.paginate(total))
        .with_message(message)
        .with_filter("format", q.format)
        .with_filter("category", q.category.as_deref())
        .with_filter("tags", q.tags.as_deref())
        .with_filter("search", q.search.as_deref())
}

#[utoipa::path(
    get,
    path = "/api/resources",
    tag = "resources",
    params(ResourceQuery),
    responses(
        (status = 200, description = "Resources, newest first", body = ListResponse<Resource>),
        (status = 400, description = "Invalid query parameters"),
    )
)]
pub async fn list_public_resources(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<ResourceQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let (resources, total) = state.store.list_resources(&resource_filter(&q), page).await?;
    Ok((PUBLIC_CACHE, Json(resource_list(resources, total, page, &q))))
}
