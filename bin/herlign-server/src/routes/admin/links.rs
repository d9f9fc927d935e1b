use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Link};
use crate::entities::LinkStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::schemas::link::{CreateLinkRequest, LinkQuery, UpdateLinkRequest};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_links, create_link, get_link, update_link, delete_link),
    components(schemas(CreateLinkRequest, UpdateLinkRequest))
)]
pub struct AdminLinkApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/links", get(list_links).post(create_link))
        .route("/links/{id}", get(get_link).put(update_link).delete(delete_link))
}

fn not_found_or_unauthorized() -> ServerError {
    ServerError::NotFound("Link not found or unauthorized".into())
}

#[utoipa::path(
    get,
    path = "/api/admin/links",
    tag = "admin-links",
    security(("bearer" = [])),
    params(LinkQuery),
    responses((status = 200, description = "Links, newest first", body = ListResponse<Link>))
)]
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<LinkQuery>,
) -> Result<Json<ListResponse<Link>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let category = q.category.as_deref().filter(|c| !c.trim().is_empty());
    let (links, total) = state.store.list_links(category, page).await?;
    let message = format!("Successfully retrieved {} link(s)", links.len());
    Ok(Json(
        ListResponse::new(links, page.paginate(total))
            .with_message(message)
            .with_filter("category", category),
    ))
}

#[utoipa::path(
    post,
    path = "/api/admin/links",
    tag = "admin-links",
    security(("bearer" = [])),
    request_body = CreateLinkRequest,
    responses(
        (status = 201, description = "Link created", body = DataResponse<Link>),
        (status = 400, description = "Validation failed"),
    )
)]
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    ValidJson(req): ValidJson<CreateLinkRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let now = Utc::now();
    let link = Link {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        href: req.href,
        category: req.category,
        admin_id: admin.id,
        created_at: now,
        updated_at: now,
    };
    state.store.insert_link(&link).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new("Link created successfully", link))))
}

#[utoipa::path(
    get,
    path = "/api/admin/links/{id}",
    tag = "admin-links",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Link id")),
    responses(
        (status = 200, description = "Link", body = DataResponse<Link>),
        (status = 404, description = "Link not found"),
    )
)]
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<Link>>, ServerError> {
    let link = state
        .store
        .get_link(&id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Link not found".into()))?;
    Ok(Json(DataResponse::new("Successfully retrieved link", link)))
}

#[utoipa::path(
    put,
    path = "/api/admin/links/{id}",
    tag = "admin-links",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Link id")),
    request_body = UpdateLinkRequest,
    responses(
        (status = 200, description = "Link updated", body = DataResponse<Link>),
        (status = 404, description = "Link not found or unauthorized"),
    )
)]
pub async fn update_link(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<UpdateLinkRequest>,
) -> Result<Json<DataResponse<Link>>, ServerError> {
    let link = state
        .store
        .update_link(&id, &admin.id, &req)
        .await?
        .ok_or_else(not_found_or_unauthorized)?;
    Ok(Json(DataResponse::new("Link updated successfully", link)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/links/{id}",
    tag = "admin-links",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Link id")),
    responses(
        (status = 200, description = "Link deleted", body = MessageResponse),
        (status = 404, description = "Link not found or unauthorized"),
    )
)]
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    if !state.store.delete_link(&id, &admin.id).await? {
        return Err(not_found_or_unauthorized());
    }
    Ok(Json(MessageResponse::new("Link deleted successfully")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::routes::test_support::{admin_token, authed, body_json, get, json_request, send};
    use serde_json::json;

    #[tokio::test]
    async fn category_filter_and_bad_href() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        for (name, category) in [("Mentors", "community"), ("Jobs board", "jobs")] {
            let body = json!({"name": name, "href": "https://herlign.com/x", "category": category});
            let response = send(&state, authed(json_request("POST", "/api/admin/links", body), &token)).await;
            assert_eq!(response.status(), StatusCode::CREATED);
        }
        let bad = json!({"name": "Broken", "href": "herlign dot com", "category": "jobs"});
        let response = send(&state, authed(json_request("POST", "/api/admin/links", bad), &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let public = body_json(send(&state, get("/api/links?category=jobs")).await).await;
        assert_eq!(public["pagination"]["total"], 1);
        assert_eq!(public["data"][0]["name"], "Jobs board");
    }

    #[tokio::test]
    async fn delete_by_non_owner_is_404() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, owner) = admin_token(&state, "owner@herlign.com").await;
        let (_, other) = admin_token(&state, "other@herlign.com").await;
        let body = json!({"name": "Mentors", "href": "https://herlign.com/m", "category": "community"});
        let created = body_json(send(&state, authed(json_request("POST", "/api/admin/links", body), &owner)).await).await;
        let uri = format!("/api/admin/links/{}", created["data"]["id"].as_str().unwrap());

        let response = send(&state, authed(json_request("DELETE", &uri, json!({})), &other)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Link not found or unauthorized");
        let response = send(&state, authed(json_request("DELETE", &uri, json!({})), &owner)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
