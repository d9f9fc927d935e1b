//! Guest chat: send a message, read back the session history.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{Duration, Utc};
use herlign_core::chat::{bot_reply, LIVE_MODE_NOTICE};
use herlign_core::identity::{client_ip, hash_ip};
use herlign_core::{ChatMode, GuestReplyPlan, SenderType};
use tracing::{info, warn};
use utoipa::OpenApi;
use uuid::Uuid;

use crate::completion::CompletionMessage;
use crate::entities::dao::ChatSession;
use crate::entities::{ChatStore, SessionStore};
use crate::error::ServerError;
use crate::extract::ValidJson;
use crate::middleware::rate_limit;
use crate::schemas::chat::{ChatHistoryResponse, ChatMessageResponse, SendMessageRequest, SendMessageResponse};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(send_message, get_history),
    components(schemas(SendMessageRequest, SendMessageResponse, ChatHistoryResponse, ChatMessageResponse))
)]
pub struct ChatApi;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat/message", post(send_message))
        .route("/chat/history", get(get_history))
}

/// The caller's live session, or a new `auto` one.
async fn session_for(state: &AppState, headers: &HeaderMap) -> Result<ChatSession, ServerError> {
    let ip_hash = hash_ip(&client_ip(headers), &state.config.ip_hash_salt);
    let now = Utc::now();
    if let Some(session) = state.store.find_active_session(&ip_hash, now).await? {
        return Ok(session);
    }
    let session = ChatSession {
        id: Uuid::new_v4().to_string(),
        guest_ip_hash: ip_hash,
        current_mode: ChatMode::Auto,
        admin_id: None,
        last_message_at: now,
        created_at: now,
        expires_at: now + Duration::days(state.config.session_ttl_days),
    };
    state.store.create_session(&session).await?;
    info!(session_id = %session.id, "chat session created");
    Ok(session)
}

#[utoipa::path(
    post,
    path = "/api/chat/message",
    tag = "chat",
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Message stored; bot reply or live-mode notice", body = SendMessageResponse),
        (status = 400, description = "Validation failed"),
        (status = 429, description = "Too many messages"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<ValidJson<SendMessageRequest>, ServerError>,
) -> Result<Json<SendMessageResponse>, ServerError> {
    // Throttle before looking at the body so malformed floods still count.
    rate_limit::enforce(&state.rate_limiter, &headers, "chat", &state.config.rate_limits.chat, "Too many messages")?;
    let ValidJson(req) = body?;

    let session = session_for(&state, &headers).await?;
    state
        .store
        .append_message(&session.id, SenderType::Guest, &req.message)
        .await?;

    let response = match GuestReplyPlan::for_mode(session.current_mode) {
        GuestReplyPlan::GenerateReply => {
            let history: Vec<CompletionMessage> = state
                .store
                .list_messages(&session.id)
                .await?
                .into_iter()
                .map(|m| CompletionMessage::from_sender(m.sender_type, m.content))
                .collect();
            let outcome = state.completion.complete(&history).await;
            if let Err(e) = &outcome {
                warn!(session_id = %session.id, error = %e, "completion failed; serving fallback reply");
            }
            let reply = bot_reply(outcome);
            state
                .store
                .append_message(&session.id, SenderType::Bot, &reply)
                .await?;
            reply
        }
        GuestReplyPlan::AwaitAdmin => LIVE_MODE_NOTICE.to_owned(),
    };

    Ok(Json(SendMessageResponse {
        session_id: session.id,
        response,
        mode: session.current_mode,
    }))
}

#[utoipa::path(
    get,
    path = "/api/chat/history",
    tag = "chat",
    responses(
        (status = 200, description = "Messages of the caller's session, oldest first", body = ChatHistoryResponse),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_history(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ChatHistoryResponse>, ServerError> {
    let session = session_for(&state, &headers).await?;
    let messages = state.store.list_messages(&session.id).await?;
    Ok(Json(ChatHistoryResponse {
        session_id: session.id,
        mode: session.current_mode,
        messages: messages.iter().map(|m| m.to_response()).collect(),
    }))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::completion::fake::FakeCompletion;
    use crate::config::Config;
    use crate::routes::test_support::{body_json, get, json_request, send};
    use axum::http::{header, StatusCode};
    use herlign_core::chat::FALLBACK_REPLY;
    use herlign_core::{ModeTransition, RateLimitConfig};
    use serde_json::json;

    async fn only_session(state: &AppState) -> ChatSession {
        let (sessions, total) = state
            .store
            .list_active_sessions(None, Utc::now(), Default::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        sessions.into_iter().next().unwrap()
    }

    #[tokio::test]
    async fn auto_mode_stores_exactly_one_bot_reply() {
        let fake = Arc::new(FakeCompletion::replying("Update your CV first."));
        let state = AppState::for_tests(fake.clone()).await;

        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": "Hi"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], "Update your CV first.");
        assert_eq!(body["mode"], "auto");

        let session = only_session(&state).await;
        assert_eq!(body["sessionId"], session.id.as_str());
        let senders: Vec<_> = state
            .store
            .list_messages(&session.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.sender_type)
            .collect();
        assert_eq!(senders, [SenderType::Guest, SenderType::Bot]);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn completion_failure_serves_fallback_with_200() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::failing())).await;
        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": "Hello"}))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["response"], FALLBACK_REPLY);
        assert_eq!(body["mode"], "auto");

        let session = only_session(&state).await;
        let messages = state.store.list_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].content, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn live_mode_skips_the_bot() {
        let fake = Arc::new(FakeCompletion::replying("should not be used"));
        let state = AppState::for_tests(fake.clone()).await;
        send(&state, json_request("POST", "/api/chat/message", json!({"message": "first"}))).await;
        let session = only_session(&state).await;
        state
            .store
            .apply_mode_transition(
                &session.id,
                &ModeTransition { mode: ChatMode::Live, admin_id: Some("admin-1".into()) },
            )
            .await
            .unwrap();

        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": "second"}))).await;
        let body = body_json(response).await;
        assert_eq!(body["response"], LIVE_MODE_NOTICE);
        assert_eq!(body["mode"], "live");
        let messages = state.store.list_messages(&session.id).await.unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].sender_type, SenderType::Guest);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn empty_and_oversized_messages_are_rejected() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::replying("ok"))).await;
        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": ""}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let long = "x".repeat(2001);
        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": long}))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Validation failed");
    }

    #[tokio::test]
    async fn message_over_the_window_limit_gets_429() {
        let mut config = Config::for_tests();
        config.rate_limits.chat = RateLimitConfig::new(2, 60);
        let state = AppState::for_tests_with(config, Arc::new(FakeCompletion::replying("ok"))).await;

        for _ in 0..2 {
            let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": "hi"}))).await;
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = send(&state, json_request("POST", "/api/chat/message", json!({"message": "hi"}))).await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(response.headers().contains_key(header::RETRY_AFTER));
        let body = body_json(response).await;
        assert_eq!(body["error"], "Too many messages");
        assert!(body["resetIn"].as_u64().unwrap() <= 60);
    }

    #[tokio::test]
    async fn history_reuses_the_session() {
        let state = AppState::for_tests(Arc::new(FakeCompletion::replying("Sure."))).await;
        let first = body_json(send(&state, json_request("POST", "/api/chat/message", json!({"message": "Q"}))).await).await;

        let history = body_json(send(&state, get("/api/chat/history")).await).await;
        assert_eq!(history["sessionId"], first["sessionId"]);
        assert_eq!(history["mode"], "auto");
        let messages = history["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["sender"], "guest");
        assert_eq!(messages[1]["sender"], "bot");
        assert!(messages[0]["timestamp"].is_string());
    }
}
