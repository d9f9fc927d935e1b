//! Admin chat console: list live sessions, read a transcript, reply, and
//! switch a session between bot and human handling.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use herlign_core::chat::transition;
use herlign_core::{ChatMode, SenderType};
use tracing::info;
use utoipa::OpenApi;

use crate::entities::dao::{AdminUser, ChatSession};
use crate::entities::{ChatStore, SessionStore};
use crate::error::ServerError;
use crate::extract::{page_params, ValidJson, ValidQuery};
use crate::schemas::chat::{
    AdminReplyRequest, ChatSessionDetail, ChatSessionResponse, SessionListQuery, SwitchModeRequest,
};
use crate::schemas::{DataResponse, ListResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(list_sessions, get_session, reply_to_session, switch_mode),
    components(schemas(ChatSessionResponse, ChatSessionDetail, AdminReplyRequest, SwitchModeRequest))
)]
pub struct AdminChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/sessions", get(list_sessions))
        .route("/chat/sessions/{id}", get(get_session).post(reply_to_session))
        .route("/chat/sessions/{id}/mode", post(switch_mode))
}

async fn existing_session(state: &AppState, id: &str) -> Result<ChatSession, ServerError> {
    state
        .store
        .get_session(id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Session not found".into()))
}

#[utoipa::path(
    get,
    path = "/api/admin/chat/sessions",
    tag = "admin-chat",
    security(("bearer" = [])),
    params(SessionListQuery),
    responses((status = 200, description = "Unexpired sessions, most recent activity first", body = ListResponse<ChatSessionResponse>))
)]
pub async fn list_sessions(
    State(state): State<Arc<AppState>>,
    ValidQuery(q): ValidQuery<SessionListQuery>,
) -> Result<Json<ListResponse<ChatSessionResponse>>, ServerError> {
    let page = page_params(q.page, q.limit)?;
    let (sessions, total) = state.store.list_active_sessions(q.mode, Utc::now(), page).await?;
    let message = format!("Successfully retrieved {} chat session(s)", sessions.len());
    let data = sessions.iter().map(ChatSession::to_response).collect();
    Ok(Json(
        ListResponse::new(data, page.paginate(total))
            .with_message(message)
            .with_filter("mode", q.mode),
    ))
}

#[utoipa::path(
    get,
    path = "/api/admin/chat/sessions/{id}",
    tag = "admin-chat",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session and full transcript", body = DataResponse<ChatSessionDetail>),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DataResponse<ChatSessionDetail>>, ServerError> {
    let session = existing_session(&state, &id).await?;
    let messages = state.store.list_messages(&id).await?;
    Ok(Json(DataResponse::new(
        "Successfully retrieved chat session",
        ChatSessionDetail {
            session: session.to_response(),
            messages: messages.iter().map(|m| m.to_response()).collect(),
        },
    )))
}

/// Replying takes the session over: an `auto` session becomes `live` and
/// the bot stops answering.
#[utoipa::path(
    post,
    path = "/api/admin/chat/sessions/{id}",
    tag = "admin-chat",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Session id")),
    request_body = AdminReplyRequest,
    responses(
        (status = 200, description = "Message sent", body = DataResponse<Option<String>>),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn reply_to_session(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<AdminReplyRequest>,
) -> Result<Json<DataResponse<Option<String>>>, ServerError> {
    let session = existing_session(&state, &id).await?;
    if session.current_mode != ChatMode::Live {
        let change = transition(ChatMode::Live, Some(&admin.id))?;
        state.store.apply_mode_transition(&id, &change).await?;
        info!(session_id = %id, admin_id = %admin.id, "session taken over by admin");
    }
    state.store.append_message(&id, SenderType::Admin, &req.message).await?;
    Ok(Json(DataResponse::new("Message sent successfully", None)))
}

#[utoipa::path(
    post,
    path = "/api/admin/chat/sessions/{id}/mode",
    tag = "admin-chat",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Session id")),
    request_body = SwitchModeRequest,
    responses(
        (status = 200, description = "Mode switched", body = DataResponse<ChatSessionResponse>),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Session not found"),
    )
)]
pub async fn switch_mode(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AdminUser>,
    Path(id): Path<String>,
    ValidJson(req): ValidJson<SwitchModeRequest>,
) -> Result<Json<DataResponse<ChatSessionResponse>>, ServerError> {
    let change = transition(req.mode, Some(&admin.id))?;
    let session = state
        .store
        .apply_mode_transition(&id, &change)
        .await?
        .ok_or_else(|| ServerError::NotFound("Session not found".into()))?;
    info!(session_id = %id, mode = %req.mode, "chat mode switched");
    Ok(Json(DataResponse::new(
        format!("Chat mode switched to {}", req.mode),
        session.to_response(),
    )))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::routes::test_support::{admin_token, authed, body_json, get, json_request, send};
    use axum::http::StatusCode;
    use herlign_core::chat::LIVE_MODE_NOTICE;
    use serde_json::json;

    async fn guest_session(state: &Arc<AppState>) -> String {
        let body = body_json(send(state, json_request("POST", "/api/chat/message", json!({"message": "Hello?"}))).await).await;
        body["sessionId"].as_str().unwrap().to_owned()
    }

    #[tokio::test]
    async fn admin_reply_takes_over_the_session() {
        let fake = Arc::new(FakeCompletion::replying("bot answer"));
        let state = AppState::for_tests(fake.clone()).await;
        let (admin, token) = admin_token(&state, "a@herlign.com").await;
        let id = guest_session(&state).await;

        let uri = format!("/api/admin/chat/sessions/{id}");
        let response = send(&state, authed(json_request("POST", &uri, json!({"message": "Hi, I'm here."})), &token)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Message sent successfully");
        assert!(body["data"].is_null());

        let detail = body_json(send(&state, authed(get(&uri), &token)).await).await;
        assert_eq!(detail["data"]["session"]["current_mode"], "live");
        assert_eq!(detail["data"]["session"]["admin_id"], admin.id.as_str());
        let senders: Vec<_> = detail["data"]["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["sender"].as_str().unwrap().to_owned())
            .collect();
        assert_eq!(senders, ["guest", "bot", "admin"]);

        let next = body_json(send(&state, json_request("POST", "/api/chat/message", json!({"message": "Thanks"}))).await).await;
        assert_eq!(next["response"], LIVE_MODE_NOTICE);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn switching_back_to_auto_clears_the_admin() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::replying("ok"))).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        let id = guest_session(&state).await;
        let uri = format!("/api/admin/chat/sessions/{id}/mode");

        let live = body_json(send(&state, authed(json_request("POST", &uri, json!({"mode": "live"})), &token)).await).await;
        assert_eq!(live["message"], "Chat mode switched to live");
        assert!(live["data"]["admin_id"].is_string());

        let auto = body_json(send(&state, authed(json_request("POST", &uri, json!({"mode": "auto"})), &token)).await).await;
        assert_eq!(auto["data"]["current_mode"], "auto");
        assert!(auto["data"]["admin_id"].is_null());

        let bad = send(&state, authed(json_request("POST", &uri, json!({"mode": "manual"})), &token)).await;
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn list_filters_by_mode_and_unknown_ids_are_404() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::replying("ok"))).await;
        let (_, token) = admin_token(&state, "a@herlign.com").await;
        guest_session(&state).await;

        let all = body_json(send(&state, authed(get("/api/admin/chat/sessions"), &token)).await).await;
        assert_eq!(all["message"], "Successfully retrieved 1 chat session(s)");
        let live = body_json(send(&state, authed(get("/api/admin/chat/sessions?mode=live"), &token)).await).await;
        assert_eq!(live["pagination"]["total"], 0);
        assert_eq!(live["filters"]["mode"], "live");

        let response = send(&state, authed(get("/api/admin/chat/sessions/missing"), &token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(
            &state,
            authed(json_request("POST", "/api/admin/chat/sessions/missing/mode", json!({"mode": "live"})), &token),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
