use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::entities::dao::Testimonial;
use crate::entities::testimonial::TestimonialFilter;
use crate::entities::TestimonialStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::routes::PUBLIC_CACHE;
use crate::schemas::testimonial::TestimonialQuery;
use crate::schemas::ListResponse;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(paths(list_approved_testimonials), components(schemas(Testimonial)))]
pub struct PublicTestimonialApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/testimonials", get(list_approved_testimonials))
}

/// Approved testimonials only; `is_approved` in the query is ignored.
#[utoipa::path(
    get,
    path = "/api/testimonials",
    tag = "testimonials",
    params(TestimonialQuery),
    responses(
        (status = 200, description = "Approved testimonials, newest first", body = ListResponse<Testimonial>),
        (status = 400, description = "Invalid query parameters"),
    )
)]
pub async fn list_approved_testimonials(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<TestimonialQuery>,
) -> Result<impl IntoResponse, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let filter = TestimonialFilter {
        rating: q.rating,
        is_approved: Some(true),
    };
    let (testimonials, total) = state.store.list_testimonials(&filter, page).await?;
    Ok((PUBLIC_CACHE, Json(ListResponse::new(testimonials, page.paginate(total)))))
}
