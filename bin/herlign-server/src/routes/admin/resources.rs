use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Resource};
use crate::entities::ResourceStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::routes::public::resources::{resource_filter, resource_list};
use crate::schemas::resource::{CreateResourceRequest, ResourceQuery, UpdateResourceRequest};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_resources, create_resource, get_resource, update_resource, delete_resource),
    components(schemas(CreateResourceRequest, UpdateResourceRequest))
)]
pub struct AdminResourceApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/resources", get(list_resources).post(create_resource))
        .route("/resources/{id}", get(get_resource).put(update_resource).delete(delete_resource))
}

fn not_found_or_unauthorized() -> ServerError {
    ServerError::NotFound("Resource not found or unauthorized".into())
}

#[utoipa::path(
    get,
    path = "/api/admin/resources",
    tag = "admin-resources",
    security(("bearer" = [])),
    params(ResourceQuery),
    responses((status = 200, description = "Resources, newest first", body = ListResponse<Resource>))
)]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<ResourceQuery>,
) -> Result<Json<ListResponse<Resource>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let (resources, total) = state.store.list_resources(&resource_filter(&q), page).await?;
    Ok(Json(resource_list(resources, total, page, &q)))
}

#[utoipa::path(
    post,
    path = "/api/admin/resources",
    tag = "admin-resources",
    security(("bearer" = [])),
    request_body = CreateResourceRequest,
    responses(
        (status = 201, description = "Resource created", body = DataResponse<Resource>),
        (status = 400, description = "Validation failed"),
    )
)]
pub async fn create_resource(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    ValidJson(req): ValidJson<CreateResourceRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let now = Utc::now();
    let resource = Resource {
        id: Uuid::new_v4().to_string(),
        title: req.title,
        description: req.description,
        external_link: req.external_link,
        format: req.format,
        category: req.category,
        tags: req.tags,
        price: req.price,
        is_paid: req.is_paid,
        admin_id: admin.id,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_resource(&resource).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new("Resource created successfully", resource))))
}

#[utoipa::path(
    get,
    path = "/api/admin/resources/{id}",
    tag = "admin-resources",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource", body = DataResponse<Resource>),
        (status = 404, description = "Resource not found"),
    )
)]
pub async fn get_resource(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Resource>>, ServerError> {
    let resource = state
        .store
        .get_resource(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Resource not found".into()))?;
    Ok(Json(DataResponse::new("Successfully retrieved resource", resource)))
}

#[utoipa::path(
    put,
    path = "/api/admin/resources/{id}",
    tag = "admin-resources",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Resource id")),
    request_body = UpdateResourceRequest,
    responses(
        (status = 200, description = "Resource updated", body = DataResponse<Resource>),
        (status = 404, description = "Resource not found or unauthorized"),
    )
)]
pub async fn update_resource(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateResourceRequest>,
) -> Result<Json<DataResponse<Resource>>, ServerError> {
    let resource = state
        .store
        .update_resource(&id, &admin.id, &req)
        .await?
        .ok_or_else(not_found_or_unauthorized)?;
    Ok(Json(DataResponse::new("Resource updated successfully", resource)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/resources/{id}",
    tag = "admin-resources",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Resource id")),
    responses(
        (status = 200, description = "Resource deleted", body = MessageResponse),
        (status = 404, description = "Resource not found or unauthorized"),
    )
)]
pub async fn delete_resource(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    if !state.store.delete_resource(&id, &admin.id).await? {
        return Err(not_found_or_unauthorized());
    }
    Ok(Json(MessageResponse::new("Resource deleted successfully")))
}
