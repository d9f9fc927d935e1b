use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use utoipa::OpenApi;

use crate::entities::dao::{Event, EventStatus};
use crate::entities::event::EventFilter;
use crate::entities::EventStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::routes::PUBLIC_CACHE;
use crate::schemas::event::PublicEventQuery;
use crate::schemas::{DataResponse, ListResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_published_events, get_event_by_slug), components(schemas(Event)))]
pub struct PublicEventApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_published_events))
        .route("/events/{slug}", get(get_event_by_slug))
}

/// Published events that have not ended yet, soonest first.
#[utoipa::path(
    get,
    path = "/api/events",
    tag = "events",
    params(PublicEventQuery),
    responses(
        (status = 200, description = "Published upcoming events", body = ListResponse<Event>),
        (status = 400, description = "Invalid query parameters"),
    )
)]
pub async fn list_published_events(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<PublicEventQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let search = q.search.filter(|s| !s.trim().is_empty());
    let filter = EventFilter {
        event_type: q.event_type,
        mode: q.mode,
        status: Some(EventStatus::Published),
        search: search.clone(),
        date_from: q.date_from,
        date_to: q.date_to,
        featured: q.featured,
        ending_after: Some(Utc::now()),
        ascending: true,
    };
    let (events, total) = state.store.list_events(&filter, page).await?;

    let message = format!("Successfully retrieved {} published event(s)", events.len());
    let body = ListResponse::new(events, page.paginate(total))
        .with_message(message)
        .with_filter("status", Some(EventStatus::Published))
        .with_filter("type", q.event_type)
        .with_filter("mode", q.mode)
        .with_filter("search", search)
        .with_filter("dateFrom", q.date_from.map(|d| d.to_rfc3339()))
        .with_filter("dateTo", q.date_to.map(|d| d.to_rfc3339()))
        .with_filter("featured", q.featured);
    Ok((PUBLIC_CACHE, Json(body)))
}

#[utoipa::path(
    get,
    path = "/api/events/{slug}",
    tag = "events",
    params(("slug" = String, Path, description = "Event slug")),
    responses(
        (status = 200, description = "Published event", body = DataResponse<Event>),
        (status = 404, description = "Event not found"),
    )
)]
pub async fn get_event_by_slug(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let event = state
        .store
        .get_published_event_by_slug(&slug)
        .await?
        .ok_or_else(|| ServerError::NotFound("Event not found".into()))?;
    Ok((PUBLIC_CACHE, Json(DataResponse::new("Successfully retrieved event", event))))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::entities::event::test::event;
    use crate::routes::test_support::{body_json, get, send};
    use axum::http::{header, StatusCode};
    use chrono::Duration;

    async fn seeded() -> Arc<AppState> {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let now = Utc::now();
        for i in 0..3 {
            let e = event(&format!("Upcoming {i}"), &format!("upcoming-{i}00"), "admin-1", now + Duration::days(i + 1));
            state.store.insert_event(&e).await.unwrap();
        }
        let mut draft = event("Draft Talk", "draft-talk-100", "admin-1", now + Duration::days(2));
        draft.status = EventStatus::Draft;
        state.store.insert_event(&draft).await.unwrap();
        let mut ended = event("Ended Talk", "ended-talk-100", "admin-1", now - Duration::days(3));
        ended.end_date = now - Duration::days(2);
        state.store.insert_event(&ended).await.unwrap();
        state
    }

    #[tokio::test]
    async fn lists_only_published_upcoming_soonest_first() {
        let state = seeded().await;
        let response = send(&state, get("/api/events?limit=2")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CACHE_CONTROL],
            "public, s-maxage=300, stale-while-revalidate=600"
        );
        let body = body_json(response).await;
        assert_eq!(body["message"], "Successfully retrieved 2 published event(s)");
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["totalPages"], 2);
        assert_eq!(body["pagination"]["hasNext"], true);
        assert_eq!(body["filters"]["status"], "published");
        let titles: Vec<_> = body["data"].as_array().unwrap().iter().map(|e| e["title"].clone()).collect();
        assert_eq!(titles, ["Upcoming 0", "Upcoming 1"]);
    }

    #[tokio::test]
    async fn invalid_limit_is_rejected() {
        let state = seeded().await;
        let response = send(&state, get("/api/events?limit=101")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let response = send(&state, get("/api/events?type=webinar")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn slug_lookup_hides_drafts() {
        let state = seeded().await;
        let response = send(&state, get("/api/events/upcoming-100")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["data"]["slug"], "upcoming-100");

        let response = send(&state, get("/api/events/draft-talk-100")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Event not found");
        assert!(body["data"].is_null());
    }
}
