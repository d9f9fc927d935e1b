//! Testimonial moderation. Any admin may edit, approve or delete.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Testimonial};
use crate::entities::testimonial::TestimonialFilter;
use crate::entities::{sync_media_usage, TestimonialStore};
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::schemas::testimonial::{CreateTestimonialRequest, TestimonialQuery, UpdateTestimonialRequest};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        list_testimonials,
        create_testimonial,
        get_testimonial,
        update_testimonial,
        delete_testimonial,
        approve_testimonial
    ),
    components(schemas(CreateTestimonialRequest, UpdateTestimonialRequest))
)]
pub struct AdminTestimonialApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/testimonials", get(list_testimonials).post(create_testimonial))
        .route(
            "/testimonials/{id}",
            get(get_testimonial).put(update_testimonial).delete(delete_testimonial),
        )
        .route("/testimonials/{id}/approve", post(approve_testimonial))
}

fn not_found() -> ServerError {
    ServerError::NotFound("Testimonial not found".into())
}

#[utoipa::path(
    get,
    path = "/api/admin/testimonials",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    params(TestimonialQuery),
    responses((status = 200, description = "Testimonials, newest first", body = ListResponse<Testimonial>))
)]
pub async fn list_testimonials(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<TestimonialQuery>,
) -> Result<Json<ListResponse<Testimonial>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let filter = TestimonialFilter {
        rating: q.rating,
        is_approved: q.is_approved,
    };
    let (testimonials, total) = state.store.list_testimonials(&filter, page).await?;
    let message = format!("Successfully retrieved {} testimonial(s)", testimonials.len());
    Ok(Json(
        ListResponse::new(testimonials, page.paginate(total))
            .with_message(message)
            .with_filter("rating", q.rating)
            .with_filter("is_approved", q.is_approved),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/testimonials",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    request_body = CreateTestimonialRequest,
    responses(
        (status = 201, description = "Testimonial created", body = DataResponse<Testimonial>),
        (status = 400, description = "Validation failed"),
    )
)]
pub async fn create_testimonial(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    ValidJson(req): ValidJson<CreateTestimonialRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let now = Utc::now();
    let testimonial = Testimonial {
        id: Uuid::new_v4().to_string(),
        rating: req.rating,
        avatar_url: req.avatar_url,
        review: req.review,
        reviewer_name: req.reviewer_name,
        reviewer_title: req.reviewer_title,
        is_approved: req.is_approved,
        admin_id: admin.id,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_testimonial(&testimonial).await?;
    sync_media_usage(&*state.store, None, testimonial.avatar_url.as_deref()).await;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("Testimonial created successfully", testimonial)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/testimonials/{id}",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Testimonial id")),
    responses(
        (status = 200, description = "Testimonial", body = DataResponse<Testimonial>),
        (status = 404, description = "Testimonial not found"),
    )
)]
pub async fn get_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Testimonial>>, ServerError> {
    let testimonial = state.store.get_testimonial(&id).await?.ok_or_else(not_found)?;
    Ok(Json(DataResponse::new("Successfully retrieved testimonial", testimonial)))
}

#[utoipa::path(
    put,
    path = "/api/admin/testimonials/{id}",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Testimonial id")),
    request_body = UpdateTestimonialRequest,
    responses(
        (status = 200, description = "Testimonial updated", body = DataResponse<Testimonial>),
        (status = 404, description = "Testimonial not found"),
    )
)]
pub async fn update_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateTestimonialRequest>,
) -> Result<Json<DataResponse<Testimonial>>, ServerError> {
    let existing = state.store.get_testimonial(&id).await?.ok_or_else(not_found)?;
    let testimonial = state
        .store
        .update_testimonial(&id, &req)
        .await?
        .ok_or_else(not_found)?;
    if let Some(new_avatar) = &req.avatar_url {
        sync_media_usage(&*state.store, existing.avatar_url.as_deref(), new_avatar.as_deref()).await;
    }
    Ok(Json(DataResponse::new("Testimonial updated successfully", testimonial)))
}

#[utoipa::path(
    post,
    path = "/api/admin/testimonials/{id}/approve",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Testimonial id")),
    responses(
        (status = 200, description = "Testimonial approved", body = DataResponse<Testimonial>),
        (status = 404, description = "Testimonial not found"),
    )
)]
pub async fn approve_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Testimonial>>, ServerError> {
    let testimonial = state.store.approve_testimonial(&id).await?.ok_or_else(not_found)?;
    Ok(Json(DataResponse::new("Testimonial approved successfully", testimonial)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/testimonials/{id}",
    tag = "admin-testimonials",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Testimonial id")),
    responses(
        (status = 200, description = "Testimonial deleted", body = MessageResponse),
        (status = 404, description = "Testimonial not found"),
    )
)]
pub async fn delete_testimonial(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let testimonial = state.store.delete_testimonial(&id).await?.ok_or_else(not_found)?;
    sync_media_usage(&*state.store, testimonial.avatar_url.as_deref(), None).await;
    Ok(Json(MessageResponse::new("Testimonial deleted successfully")))
}
