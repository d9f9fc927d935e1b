//! Media library: uploads land in `media_dir` and are served under `/media`.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use herlign_core::media::{check_upload, MAX_UPLOAD_BYTES};
use herlign_core::CoreError;
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::entities::dao::{AdminUser, Media};
use crate::entities::MediaStore;
use crate::error::ServerError;
use crate::extract::{page_params, ValidQuery};
use crate::middleware::rate_limit;
use crate::schemas::media::{MediaQuery, MediaResponse, MediaUploadForm};
use crate::schemas::{DataResponse, ListResponse, MessageResponse};
use crate::state::AppState;

const MAX_ALT_TEXT: usize = 500;

/// Room for the multipart framing and the alt text on top of the file.
const FORM_OVERHEAD: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(upload_media, list_media, list_unused_media, delete_media),
    components(schemas(MediaResponse, MediaUploadForm))
)]
pub struct AdminMediaApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/media/upload",
            post(upload_media).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD)),
        )
        .route("/media", get(list_media))
        .route("/media/unused", get(list_unused_media))
        .route("/media/{id}", delete(delete_media))
}

fn multipart_error(e: MultipartError) -> ServerError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        CoreError::FileTooLarge.into()
    } else {
        ServerError::BadRequest(e.body_text())
    }
}

/// File name on disk for a media URL built by [`upload_media`].
fn stored_name(url: &str) -> Option<&str> {
    let (_, name) = url.rsplit_once("/media/")?;
    let plain = !name.is_empty() && name != ".." && !name.contains(['/', '\\']);
    plain.then_some(name)
}

struct Upload {
    file_name: String,
    mime_type: String,
    bytes: axum::body::Bytes,
}

#[utoipa::path(
    post,
    path = "/api/admin/media/upload",
    tag = "admin-media",
    security(("bearer" = [])),
    request_body(content = MediaUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = DataResponse<MediaResponse>),
        (status = 400, description = "Missing file, bad type or too large"),
        (status = 429, description = "Too many upload attempts"),
    )
)]
pub async fn upload_media(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    rate_limit::enforce(
        &state.rate_limiter,
        &headers,
        "upload",
        &state.config.rate_limits.upload,
        "Too many upload attempts",
    )?;

    let mut upload = None;
    let mut alt_text = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload").to_owned();
                let mime_type = field.content_type().unwrap_or_default().to_owned();
                let bytes = field.bytes().await.map_err(multipart_error)?;
                upload = Some(Upload { file_name, mime_type, bytes });
            }
            Some("alt_text") => {
                let text = field.text().await.map_err(multipart_error)?;
                alt_text = Some(text).filter(|t| !t.trim().is_empty());
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    if alt_text.as_ref().is_some_and(|t| t.chars().count() > MAX_ALT_TEXT) {
        return Err(ServerError::BadRequest("Invalid alt text".into()));
    }
    let ext = check_upload(&upload.mime_type, upload.bytes.len())?;

    let id = Uuid::new_v4().to_string();
    let stored = format!("{id}.{ext}");
    let dir = FsPath::new(&state.config.media_dir);
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| ServerError::Internal(format!("create media dir: {e}")))?;
    let path = dir.join(&stored);
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| ServerError::Internal(format!("write {}: {e}", path.display())))?;

    let media = Media {
        id,
        file_name: upload.file_name,
        url: format!("{}/media/{stored}", state.config.public_base_url.trim_end_matches('/')),
        mime_type: upload.mime_type,
        size: upload.bytes.len() as i64,
        alt_text,
        use_count: 0,
        admin_id: admin.id,
        created_at: Utc::now(),
    };
    if let Err(e) = state.store.insert_media(&media).await {
        if let Err(io) = tokio::fs::remove_file(&path).await {
            warn!(path = %path.display(), error = %io, "failed to remove orphaned upload");
        }
        return Err(e.into());
    }

    info!(media_id = %media.id, size = media.size, mime = %media.mime_type, "media uploaded");
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new("File uploaded successfully", media.to_response())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/media",
    tag = "admin-media",
    security(("bearer" = [])),
    params(MediaQuery),
    responses((status = 200, description = "Media files, newest first", body = ListResponse<MediaResponse>))
)]
pub async fn list_media(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<MediaQuery>,
) -> Result<Json<ListResponse<MediaResponse>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let (media, total) = state.store.list_media(q.is_used, page).await?;
    let message = format!("Successfully retrieved {} media file(s)", media.len());
    let media = media.into_iter().map(Media::to_response).collect();
    Ok(Json(
        ListResponse::new(media, page.paginate(total))
            .with_message(message)
            .with_filter("is_used", q.is_used),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/media/unused",
    tag = "admin-media",
    security(("bearer" = [])),
    responses((status = 200, description = "Unreferenced files, oldest first", body = DataResponse<Vec<MediaResponse>>))
)]
pub async fn list_unused_media(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DataResponse<Vec<MediaResponse>>>, ServerError> {
    let media = state.store.list_unused_media().await?;
    let message = format!("Successfully retrieved {} unused media file(s)", media.len());
    let media = media.into_iter().map(Media::to_response).collect();
    Ok(Json(DataResponse::new(message, media)))
}

#[utoipa::path(
    delete,
    path = "/api/admin/media/{id}",
    tag = "admin-media",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Media id")),
    responses(
        (status = 200, description = "Media deleted", body = MessageResponse),
        (status = 404, description = "Media not found or unauthorized"),
    )
)]
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ServerError> {
    let not_found = || ServerError::NotFound("Media not found or unauthorized".into());
    let media = state
        .store
        .get_media(&id)
        .await?
        .filter(|m| m.admin_id == admin.id)
        .ok_or_else(not_found)?;

    match stored_name(&media.url) {
        Some(name) => {
            let path = FsPath::new(&state.config.media_dir).join(name);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    warn!(path = %path.display(), "media file already gone");
                }
                Err(e) => {
                    return Err(ServerError::Internal(format!("remove {}: {e}", path.display())));
                }
            }
        }
        None => warn!(url = %media.url, "media url does not point into the media dir"),
    }

    if !state.store.delete_media(&id, &admin.id).await? {
        return Err(not_found());
    }
    Ok(Json(MessageResponse::new("Media deleted successfully")))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::routes::test_support::{admin_token, authed, body_json, get, send};
    use axum::body::Body;
    use axum::http::{header, Request};

    const BOUNDARY: &str = "herlign-test-boundary";

    fn upload_request(token: &str, mime: &str, bytes: &[u8], alt: Option<&str>) -> Request<Body> {
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"photo.png\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
        if let Some(alt) = alt {
            body.extend_from_slice(
                format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"alt_text\"\r\n\r\n{alt}\r\n")
                    .as_bytes(),
            );
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        let req = Request::builder()
            .method("POST")
            .uri("/api/admin/media/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .header("x-forwarded-for", "198.51.100.7")
            .body(Body::from(body))
            .unwrap();
        authed(req, token)
    }

    #[test]
    fn stored_name_rejects_paths() {
        assert_eq!(stored_name("http://localhost:3000/media/abc.png"), Some("abc.png"));
        assert_eq!(stored_name("http://localhost:3000/media/"), None);
        assert_eq!(stored_name("https://cdn.example/x.png"), None);
    }

    #[tokio::test]
    async fn upload_list_and_delete() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;

        let response = send(&state, upload_request(&token, "image/png", b"\x89PNG fake", Some("Team photo"))).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "File uploaded successfully");
        assert_eq!(body["data"]["file_name"], "photo.png");
        assert_eq!(body["data"]["alt_text"], "Team photo");
        assert_eq!(body["data"]["is_used"], false);
        let url = body["data"]["url"].as_str().unwrap().to_owned();
        let id = body["data"]["id"].as_str().unwrap().to_owned();
        let on_disk = FsPath::new(&state.config.media_dir).join(stored_name(&url).unwrap());
        assert_eq!(tokio::fs::read(&on_disk).await.unwrap(), b"\x89PNG fake");

        let listed = body_json(send(&state, authed(get("/api/admin/media"), &token)).await).await;
        assert_eq!(listed["pagination"]["total"], 1);
        let unused = body_json(send(&state, authed(get("/api/admin/media/unused"), &token)).await).await;
        assert_eq!(unused["message"], "Successfully retrieved 1 unused media file(s)");

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/media/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = send(&state, authed(req, &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(tokio::fs::metadata(&on_disk).await.is_err());
    }

    #[tokio::test]
    async fn rejects_bad_type_and_missing_file() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;

        let response = send(&state, upload_request(&token, "image/gif", b"GIF89a", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(
            body["error"],
            "File type must be one of: image/jpeg, image/png, image/webp, image/svg+xml"
        );

        let req = Request::builder()
            .method("POST")
            .uri("/api/admin/media/upload")
            .header("content-type", format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(format!("--{BOUNDARY}--\r\n")))
            .unwrap();
        let response = send(&state, authed(req, &token)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "No file provided");
    }

    #[tokio::test]
    async fn only_the_uploader_can_delete() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, owner) = admin_token(&state, "owner@herlign.com").await;
        let (_, other) = admin_token(&state, "other@herlign.com").await;
        let body = body_json(send(&state, upload_request(&owner, "image/webp", b"RIFF", None)).await).await;
        let id = body["data"]["id"].as_str().unwrap();

        let req = Request::builder()
            .method("DELETE")
            .uri(format!("/api/admin/media/{id}"))
            .body(Body::empty())
            .unwrap();
        let response = send(&state, authed(req, &other)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["message"], "Media not found or unauthorized");
    }

    #[tokio::test]
    async fn served_files_cannot_run_script() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(1)</script></svg>"#;
        let body = body_json(send(&state, upload_request(&token, "image/svg+xml", svg, None)).await).await;
        let url = body["data"]["url"].as_str().unwrap();

        let response = send(&state, get(&format!("/media/{}", stored_name(url).unwrap()))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let csp = response.headers()[header::CONTENT_SECURITY_POLICY].to_str().unwrap();
        assert!(csp.starts_with("default-src 'none'"));
        assert!(csp.contains("sandbox"));
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }
}
