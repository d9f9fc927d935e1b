//! `/api/admin/*`: everything here requires a valid admin bearer token.

mod chat;
mod dashboard;
mod events;
mod links;
mod media;
mod podcasts;
mod resources;
mod testimonials;

use std::sync::Arc;

use axum::{middleware, Router};
use utoipa::OpenApi;

use crate::middleware::auth;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .merge(chat::router())
        .merge(events::router())
        .merge(resources::router())
        .merge(testimonials::router())
        .merge(links::router())
        .merge(podcasts::router())
        .merge(media::router())
        .merge(dashboard::router())
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::require_admin))
        .with_state(state)
}

#[derive(OpenApi)]
#[openapi()]
pub struct AdminApi;

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = AdminApi::openapi();
    spec.merge(chat::AdminChatApi::openapi());
    spec.merge(events::AdminEventApi::openapi());
    spec.merge(resources::AdminResourceApi::openapi());
    spec.merge(testimonials::AdminTestimonialApi::openapi());
    spec.merge(links::AdminLinkApi::openapi());
    spec.merge(podcasts::AdminPodcastApi::openapi());
    spec.merge(media::AdminMediaApi::openapi());
    spec.merge(dashboard::DashboardApi::openapi());
    spec
}

#[cfg(test)]
mod test {
    use crate::completion::fake::FakeCompletion;
    use crate::routes::test_support::{authed, get, send};
    use crate::state::AppState;
    use axum::http::StatusCode;
    use std::sync::Arc;

    #[tokio::test]
    async fn every_admin_route_needs_a_token() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        for uri in [
            "/api/admin/dashboard",
            "/api/admin/events",
            "/api/admin/resources",
            "/api/admin/testimonials",
            "/api/admin/links",
            "/api/admin/podcasts",
            "/api/admin/media",
            "/api/admin/chat/sessions",
        ] {
            let response = send(&state, get(uri)).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
            let response = send(&state, authed(get(uri), "not-a-token")).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }
    }
}
