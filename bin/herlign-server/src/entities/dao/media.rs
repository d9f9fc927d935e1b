use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A row in the `media` table.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Media {
    pub id: String,
    pub file_name: String,
    pub url: String,
    pub mime_type: String,
    pub size: i64,
    pub alt_text: Option<String>,
    pub use_count: i64,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
}

impl Media {
    /// Referenced by at least one content row.
    pub fn is_used(&self) -> bool {
        self.use_count > 0
    }
}
