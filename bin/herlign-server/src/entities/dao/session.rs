use chrono::{DateTime, Utc};
use herlign_core::ChatMode;

/// A row in the `chat_sessions` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ChatSession {
    pub id: String,
    pub guest_ip_hash: String,
    #[sqlx(try_from = "String")]
    pub current_mode: ChatMode,
    /// Admin who took the session over; only set in live mode.
    pub admin_id: Option<String>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
