use chrono::{DateTime, Utc};
use herlign_core::SenderType;

/// A row in the `chat_messages` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatMessage {
    pub id: String,
    pub session_id: String,
    #[sqlx(try_from = "String")]
    pub sender_type: SenderType,
    pub content: String,
    pub created_at: DateTime<Utc>,
}
