//! Podcast catalogue. Not owner-restricted; an update records the editor
//! as the podcast's admin. `POST /podcasts/sync` mirrors the configured
//! YouTube channel into the catalogue.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use herlign_core::PageParams;
use tracing::info;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Podcast};
use crate::entities::{sync_media_usage, PodcastStore};
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::routes::public::podcasts::podcast_filter;
use crate::schemas::podcast::{
    CreatePodcastRequest, PodcastQuery, PodcastSort, PodcastSyncCounts, UpdatePodcastRequest,
};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_podcasts, create_podcast, sync_podcasts, get_podcast, update_podcast, delete_podcast),
    components(schemas(CreatePodcastRequest, UpdatePodcastRequest, PodcastSort, PodcastSyncCounts))
)]
pub struct AdminPodcastApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/podcasts", get(list_podcasts).post(create_podcast))
        .route("/podcasts/sync", post(sync_podcasts))
        .route("/podcasts/{id}", get(get_podcast).put(update_podcast).delete(delete_podcast))
}

fn not_found() -> ServerError {
    ServerError::NotFound("Podcast not found".into())
}

#[utoipa::path(
    get,
    path = "/api/admin/podcasts",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    params(PodcastQuery),
    responses((status = 200, description = "Podcasts, hidden ones included", body = ListResponse<Podcast>))
)]
pub async fn list_podcasts(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<PodcastQuery>,
) -> Result<Json<ListResponse<Podcast>>, ServerError> {
    let page: PageParams = page_params(q.page, q.limit)?;
    let filter = podcast_filter(&q, PodcastSort::default());
    let (podcasts, total) = state.store.list_podcasts(&filter, page).await?;
    let message = format!("Successfully retrieved {} podcast(s)", podcasts.len());
    Ok(Json(
        ListResponse::new(podcasts, page.paginate(total))
            .with_message(message)
            .with_filter("search", filter.search.as_deref())
            .with_filter("tags", q.tags.as_deref())
            .with_filter("is_visible", q.is_visible),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/podcasts",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    request_body = CreatePodcastRequest,
    responses(
        (status = 201, description = "Podcast created", body = DataResponse<Podcast>),
        (status = 400, description = "Validation failed or duplicate video id"),
    )
)]
pub async fn create_podcast(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    ValidJson(req): ValidJson<CreatePodcastRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if state.store.video_id_taken(&req.youtube_video_id).await? {
        return Err(ServerError::BadRequest(
            "Podcast with this YouTube video ID already exists".into(),
        ));
    }
    let now = Utc::now();
    let podcast = Podcast {
        id: Uuid::new_v4().to_string(),
        youtube_video_id: req.youtube_video_id,
        title: req.title,
        description: req.description,
        thumbnail_url: req.thumbnail_url,
        published_at: req.published_at,
        duration: req.duration,
        view_count: req.view_count,
        like_count: req.like_count,
        comment_count: req.comment_count,
        channel_title: req.channel_title,
        tags: req.tags,
        category_id: req.category_id,
        is_visible: req.is_visible,
        admin_id: admin.id,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_podcast(&podcast).await?;
    sync_media_usage(&*state.store, None, podcast.thumbnail_url.as_deref()).await;
    Ok((StatusCode::CREATED, Json(DataResponse::new("Podcast created successfully", podcast))))
}

#[utoipa::path(
    post,
    path = "/api/admin/podcasts/sync",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Catalogue mirrors the channel", body = DataResponse<PodcastSyncCounts>),
        (status = 502, description = "YouTube request failed"),
        (status = 503, description = "YouTube credentials not configured"),
    )
)]
pub async fn sync_podcasts(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
) -> Result<Json<DataResponse<PodcastSyncCounts>>, ServerError> {
    let videos = state.youtube.channel_videos().await?;
    // An empty fetch is more likely an API hiccup than an emptied channel.
    if videos.is_empty() {
        return Ok(Json(DataResponse::new(
            "No videos found on YouTube channel",
            PodcastSyncCounts::default(),
        )));
    }

    let outcome = state.store.sync_podcasts(&videos, &admin.id).await?;
    for url in &outcome.released_thumbnails {
        sync_media_usage(&*state.store, Some(url), None).await;
    }
    let counts = outcome.counts;
    info!(
        admin_id = %admin.id,
        added = counts.added,
        updated = counts.updated,
        removed = counts.removed,
        "podcasts synced from YouTube"
    );
    Ok(Json(DataResponse::new("Podcasts synced successfully from YouTube", counts)))
}

#[utoipa::path(
    get,
    path = "/api/admin/podcasts/{id}",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "Podcast", body = DataResponse<Podcast>),
        (status = 404, description = "Podcast not found"),
    )
)]
pub async fn get_podcast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Podcast>>, ServerError> {
    let podcast = state.store.get_podcast(&id).await?.ok_or_else(not_found)?;
    Ok(Json(DataResponse::new("Podcast retrieved successfully", podcast)))
}

#[utoipa::path(
    put,
    path = "/api/admin/podcasts/{id}",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Podcast id")),
    request_body = UpdatePodcastRequest,
    responses(
        (status = 200, description = "Podcast updated", body = DataResponse<Podcast>),
        (status = 404, description = "Podcast not found"),
    )
)]
pub async fn update_podcast(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdatePodcastRequest>,
) -> Result<Json<DataResponse<Podcast>>, ServerError> {
    let existing = state.store.get_podcast(&id).await?.ok_or_else(not_found)?;
    let podcast = state
        .store
        .update_podcast(&id, &admin.id, &req)
        .await?
        .ok_or_else(not_found)?;
    if let Some(new_thumb) = &req.thumbnail_url {
        sync_media_usage(&*state.store, existing.thumbnail_url.as_deref(), new_thumb.as_deref()).await;
    }
    Ok(Json(DataResponse::new("Podcast updated successfully", podcast)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/podcasts/{id}",
    tag = "admin-podcasts",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Podcast id")),
    responses(
        (status = 200, description = "Podcast deleted", body = MessageResponse),
        (status = 404, description = "Podcast not found"),
    )
)]
pub async fn delete_podcast(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let podcast = state.store.delete_podcast(&id).await?.ok_or_else(not_found)?;
    sync_media_usage(&*state.store, podcast.thumbnail_url.as_deref(), None).await;
    Ok(Json(MessageResponse::new("Podcast deleted successfully")))
}
