//! Event management. Update and delete only touch events the caller owns.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use herlign_core::slug::{slug_from_title, slug_with_timestamp};
use rand::Rng;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Event};
use crate::entities::event::EventFilter;
use crate::entities::{sync_media_usage, EventStore, Store};
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::schemas::event::{check_date_order, AdminEventQuery, CreateEventRequest, UpdateEventRequest};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

const SLUG_ATTEMPTS: usize = 10;

#[derive(OpenApi)]
#[openapi(
    paths(list_events, create_event, get_event, update_event, delete_event),
    components(schemas(CreateEventRequest, UpdateEventRequest))
)]
pub struct AdminEventApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event).put(update_event).delete(delete_event))
}

fn not_found_or_unauthorized() -> ServerError {
    ServerError::NotFound("Event not found or unauthorized".into())
}

/// A slug for `title` not used by any event other than `exclude_id`.
async fn unique_slug(store: &Store, title: &str, exclude_id: Option<&str>) -> Result<String, ServerError> {
    for _ in 0..SLUG_ATTEMPTS {
        let suffix: u16 = rand::rng().random_range(100..=999);
        let slug = slug_from_title(title, suffix);
        if !store.slug_taken(&slug, exclude_id).await? {
            return Ok(slug);
        }
    }
    warn!(title, "random slug suffixes exhausted; using timestamp");
    Ok(slug_with_timestamp(&slug_from_title(title, 100), Utc::now().timestamp_millis()))
}

#[utoipa::path(
    get,
    path = "/api/admin/events",
    tag = "admin-events",
    security(("bearer" = [])),
    params(AdminEventQuery),
    responses(
        (status = 200, description = "All events, latest start first", body = ListResponse<Event>),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<AdminEventQuery>,
) -> Result<Json<ListResponse<Event>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let filter = EventFilter {
        event_type: q.event_type,
        mode: q.mode,
        status: q.status,
        ..Default::default()
    };
    let (events, total) = state.store.list_events(&filter, page).await?;
    Ok(Json(
        ListResponse::new(events, page.paginate(total))
            .with_filter("type", q.event_type)
            .with_filter("mode", q.mode)
            .with_filter("status", q.status),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/events",
    tag = "admin-events",
    security(("bearer" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = DataResponse<Event>),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
    )
)]
pub async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    ValidJson(req): ValidJson<CreateEventRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let now = Utc::now();
    let slug = unique_slug(&state.store, &req.title, None).await?;
    let event = Event {
        id: Uuid::new_v4().to_string(),
        event_type: req.event_type,
        mode: req.mode,
        title: req.title,
        slug,
        description: req.description,
        external_link: req.external_link,
        start_date: req.start_date,
        end_date: req.end_date,
        max_attendees: req.max_attendees,
        image_url: req.image_url,
        price: req.price,
        is_paid: req.is_paid,
        status: req.status,
        featured: req.featured,
        admin_id: admin.id,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_event(&event).await?;
    sync_media_usage(&*state.store, None, event.image_url.as_deref()).await;
    info!(event_id = %event.id, slug = %event.slug, "event created");

    Ok((StatusCode::CREATED, Json(DataResponse::new("Event created successfully", event))))
}

#[utoipa::path(
    get,
    path = "/api/admin/events/{id}",
    tag = "admin-events",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = DataResponse<Event>),
        (status = 404, description = "Event not found"),
    )
)]
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Event>>, ServerError> {
    let event = state
        .store
        .get_event(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Event not found".into()))?;
    Ok(Json(DataResponse::new("Successfully retrieved event", event)))
}

/// Partial update. A new title regenerates the slug; a new `image_url`
/// moves the media reference counts.
#[utoipa::path(
    put,
    path = "/api/admin/events/{id}",
    tag = "admin-events",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Event id")),
    request_body = UpdateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = DataResponse<Event>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Event not found or unauthorized"),
    )
)]
pub async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateEventRequest>,
) -> Result<Json<DataResponse<Event>>, ServerError> {
    let existing = state
        .store
        .get_event(&id)
        .await?
        .filter(|e| e.admin_id == admin.id)
        .ok_or_else(not_found_or_unauthorized)?;

    // Dates supplied alone must still be ordered against the stored other half.
    check_date_order(
        req.start_date.unwrap_or(existing.start_date),
        req.end_date.unwrap_or(existing.end_date),
    )
    .map_err(|e| ServerError::Validation(e.to_string()))?;

    let slug = match &req.title {
        Some(title) if *title != existing.title => Some(unique_slug(&state.store, title, Some(&id)).await?),
        _ => None,
    };

    let event = state
        .store
        .update_event(&id, &admin.id, &req, slug.as_deref())
        .await?
        .ok_or_else(not_found_or_unauthorized)?;

    if let Some(new_image) = &req.image_url {
        sync_media_usage(&*state.store, existing.image_url.as_deref(), new_image.as_deref()).await;
    }
    Ok(Json(DataResponse::new("Event updated successfully", event)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/events/{id}",
    tag = "admin-events",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted", body = MessageResponse),
        (status = 404, description = "Event not found or unauthorized"),
    )
)]
pub async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let event = state
        .store
        .delete_event(&id, &admin.id)
        .await?
        .ok_or_else(not_found_or_unauthorized)?;
    sync_media_usage(&*state.store, event.image_url.as_deref(), None).await;
    info!(event_id = %event.id, "event deleted");
    Ok(Json(MessageResponse::new("Event deleted successfully")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::entities::media::test::media;
    use crate::entities::MediaStore;
    use crate::routes::test_support::{admin_token, authed, body_json, get, json_request, send};
    use herlign_core::slug::is_valid_slug;
    use serde_json::json;

    fn create_body() -> serde_json::Value {
        json!({
            "type": "workshop",
            "mode": "online",
            "title": "Negotiation Lab",
            "description": "Practice salary negotiation with peers.",
            "start_date": "2030-05-01T17:00:00Z",
            "end_date": "2030-05-01T19:00:00Z",
            "status": "published"
        })
    }

    #[tokio::test]
    async fn create_assigns_slug_and_owner() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (admin, token) = admin_token(&state, "a@herlign.com").await;

        let response = send(&state, authed(json_request("POST", "/api/admin/events", create_body()), &token)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Event created successfully");
        let slug = body["data"]["slug"].as_str().unwrap();
        assert!(slug.starts_with("negotiation-lab-"), "{slug}");
        assert!(is_valid_slug(slug));
        assert_eq!(body["data"]["admin_id"], admin.id.as_str());
        assert_eq!(body["data"]["type"], "workshop");
    }

    #[tokio::test]
    async fn invalid_body_is_400() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        let mut body = create_body();
        body["end_date"] = json!("2030-04-01T00:00:00Z");
        let response = send(&state, authed(json_request("POST", "/api/admin/events", body), &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Validation failed");
    }

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, owner) = admin_token(&state, "owner@herlign.com").await;
        let (_, other) = admin_token(&state, "other@herlign.com").await;
        let created = body_json(send(&state, authed(json_request("POST", "/api/admin/events", create_body()), &owner)).await).await;
        let uri = format!("/api/admin/events/{}", created["data"]["id"].as_str().unwrap());

        let response = send(&state, authed(json_request("PUT", &uri, json!({"featured": true})), &other)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Event not found or unauthorized");
        let response = send(&state, authed(json_request("DELETE", &uri, json!({})), &other)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&state, authed(json_request("DELETE", &uri, json!({})), &owner)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let response = send(&state, authed(get(&uri), &owner)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn title_change_regenerates_slug_and_image_moves_use_counts() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (admin, token) = admin_token(&state, "a@herlign.com").await;
        let first = media("http://localhost:3000/media/a.png", &admin.id);
        let second = media("http://localhost:3000/media/b.png", &admin.id);
        state.store.insert_media(&first).await.unwrap();
        state.store.insert_media(&second).await.unwrap();

        let mut body = create_body();
        body["image_url"] = json!(first.url);
        let created = body_json(send(&state, authed(json_request("POST", "/api/admin/events", body), &token)).await).await;
        let uri = format!("/api/admin/events/{}", created["data"]["id"].as_str().unwrap());
        assert_eq!(state.store.get_media(&first.id).await.unwrap().unwrap().use_count, 1);

        let response = send(
            &state,
            authed(json_request("PUT", &uri, json!({"title": "Pay Equity Clinic", "image_url": second.url})), &token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["data"]["slug"].as_str().unwrap().starts_with("pay-equity-clini-"));
        assert_eq!(state.store.get_media(&first.id).await.unwrap().unwrap().use_count, 0);
        assert_eq!(state.store.get_media(&second.id).await.unwrap().unwrap().use_count, 1);

        let response = send(&state, authed(json_request("PUT", &uri, json!({"image_url": null})), &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["data"]["image_url"].is_null());
        assert_eq!(state.store.get_media(&second.id).await.unwrap().unwrap().use_count, 0);
    }

    #[tokio::test]
    async fn lone_end_date_is_checked_against_stored_start() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        let created = body_json(send(&state, authed(json_request("POST", "/api/admin/events", create_body()), &token)).await).await;
        let uri = format!("/api/admin/events/{}", created["data"]["id"].as_str().unwrap());
        let response = send(&state, authed(json_request("PUT", &uri, json!({"end_date": "2030-04-01T00:00:00Z"})), &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
