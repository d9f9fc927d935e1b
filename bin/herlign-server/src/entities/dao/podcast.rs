use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A row in the `podcasts` table.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Podcast {
    pub id: String,
    pub youtube_video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    /// ISO 8601 duration as reported by YouTube, e.g. `PT42M10S`.
    pub duration: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub channel_title: Option<String>,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub is_visible: bool,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
