//! Unauthenticated content listings. Every list response is CDN-cacheable.

mod events;
mod links;
pub(crate) mod podcasts;
pub(crate) mod resources;
mod testimonials;

use std::sync::Arc;

use axum::Router;
use utoipa::OpenApi;

use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(events::router())
        .merge(resources::router())
        .merge(testimonials::router())
        .merge(links::router())
        .merge(podcasts::router())
}

pub fn api_docs() -> utoipa::openapi::OpenApi {
    let mut spec = events::PublicEventApi::openapi();
    spec.merge(resources::PublicResourceApi::openapi());
    spec.merge(testimonials::PublicTestimonialApi::openapi());
    spec.merge(links::PublicLinkApi::openapi());
    spec.merge(podcasts::PublicPodcastApi::openapi());
    spec
}
