use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::dao::Podcast;
use crate::entities::podcast::PodcastFilter;
use crate::entities::{parse_tag_list, PodcastStore};
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::routes::PUBLIC_CACHE;
use crate::schemas::podcast::{PodcastQuery, PodcastSort};
use crate::schemas::ListResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_visible_podcasts), components(schemas(Podcast)))]
pub struct PublicPodcastApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/podcasts", get(list_visible_podcasts))
}

/// Store filter for a podcast query; `default_sort` applies when `sortBy` is absent.
pub(crate) fn podcast_filter(q: &PodcastQuery, default_sort: PodcastSort) -> PodcastFilter {
    PodcastFilter {
        search: q.search.clone().filter(|s| !s.trim().is_empty()),
        tags: parse_tag_list(q.tags.as_deref()),
        date_from: q.date_from,
        date_to: q.date_to,
        is_visible: q.is_visible,
        sort_by: q.sort_by.unwrap_or(default_sort),
        sort_order: q.sort_order.unwrap_or_default(),
    }
}

/// Visible podcasts, most recently published first unless `sortBy` says otherwise.
#[utoipa::path(
    get,
    path = "/api/podcasts",
    tag = "podcasts",
    params(PodcastQuery),
    responses(
        (status = 200, description = "Visible podcasts", body = ListResponse<Podcast>),
        (status = 400, description = "Invalid query parameters"),
    )
)]
pub async fn list_visible_podcasts(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<PodcastQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let filter = PodcastFilter {
        is_visible: Some(true),
        ..podcast_filter(&q, PodcastSort::PublishedAt)
    };
    let (podcasts, total) = state.store.list_podcasts(&filter, page).await?;
    let message = format!("Successfully retrieved {} podcast(s)", podcasts.len());
    Ok((
        PUBLIC_CACHE,
        Json(ListResponse::new(podcasts, page.paginate(total)).with_message(message)),
    ))
}
