use herlign_core::{ChatMode, SenderType};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::dao::{ChatMessage, ChatSession};
use crate::entities::db_time;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SendMessageRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub session_id: String,
    pub response: String,
    pub mode: ChatMode,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessageResponse {
    pub id: String,
    pub sender: SenderType,
    pub content: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatHistoryResponse {
    pub session_id: String,
    pub mode: ChatMode,
    pub messages: Vec<ChatMessageResponse>,
}

/// Admin view of a session row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatSessionResponse {
    pub id: String,
    pub guest_ip_hash: String,
    pub current_mode: ChatMode,
    pub admin_id: Option<String>,
    pub last_message_at: String,
    pub created_at: String,
    pub expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatSessionDetail {
    pub session: ChatSessionResponse,
    pub messages: Vec<ChatMessageResponse>,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct AdminReplyRequest {
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct SwitchModeRequest {
    pub mode: ChatMode,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct SessionListQuery {
    pub mode: Option<ChatMode>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

impl ChatSession {
    pub fn to_response(&self) -> ChatSessionResponse {
        ChatSessionResponse {
            id: self.id.clone(),
            guest_ip_hash: self.guest_ip_hash.clone(),
            current_mode: self.current_mode,
            admin_id: self.admin_id.clone(),
            last_message_at: db_time(self.last_message_at),
            created_at: db_time(self.created_at),
            expires_at: db_time(self.expires_at),
        }
    }
}

impl ChatMessage {
    pub fn to_response(&self) -> ChatMessageResponse {
        ChatMessageResponse {
            id: self.id.clone(),
            sender: self.sender_type,
            content: self.content.clone(),
            timestamp: db_time(self.created_at),
        }
    }
}
