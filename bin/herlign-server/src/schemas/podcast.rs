use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::schemas::{double_option, invalid, nullable_url, valid_tags};

/// YouTube video ids are exactly 11 characters of `[A-Za-z0-9_-]`.
pub fn is_youtube_video_id(id: &str) -> bool {
    id.len() == 11 && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

fn valid_video_id(id: &str) -> Result<(), ValidationError> {
    if is_youtube_video_id(id) {
        Ok(())
    } else {
        Err(invalid("youtube_video_id", "Invalid YouTube video ID"))
    }
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreatePodcastRequest {
    #[validate(custom(function = "valid_video_id"))]
    pub youtube_video_id: String,
    #[validate(length(min = 1, max = 500))]
    pub title: String,
    pub description: Option<String>,
    #[validate(url)]
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub duration: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub view_count: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub like_count: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub comment_count: i64,
    pub channel_title: Option<String>,
    #[serde(default)]
    #[validate(custom(function = "valid_tags"))]
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    #[serde(default = "default_visible")]
    pub is_visible: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_update_podcast"))]
pub struct UpdatePodcastRequest {
    #[validate(length(min = 1, max = 500))]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub thumbnail_url: Option<Option<String>>,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub duration: Option<Option<String>>,
    #[validate(range(min = 0))]
    pub view_count: Option<i64>,
    #[validate(range(min = 0))]
    pub like_count: Option<i64>,
    #[validate(range(min = 0))]
    pub comment_count: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub channel_title: Option<Option<String>>,
    #[validate(custom(function = "valid_tags"))]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub category_id: Option<Option<String>>,
    pub is_visible: Option<bool>,
}

fn validate_update_podcast(req: &UpdatePodcastRequest) -> Result<(), ValidationError> {
    nullable_url(&req.thumbnail_url, "thumbnail_url")
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PodcastSort {
    PublishedAt,
    ViewCount,
    LikeCount,
    #[default]
    CreatedAt,
}

impl PodcastSort {
    pub fn column(self) -> &'static str {
        match self {
            PodcastSort::PublishedAt => "published_at",
            PodcastSort::ViewCount => "view_count",
            PodcastSort::LikeCount => "like_count",
            PodcastSort::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct PodcastQuery {
    #[validate(length(max = 200))]
    pub search: Option<String>,
    /// Comma-separated; matches podcasts sharing at least one tag.
    pub tags: Option<String>,
    #[serde(rename = "dateFrom")]
    pub date_from: Option<DateTime<Utc>>,
    #[serde(rename = "dateTo")]
    pub date_to: Option<DateTime<Utc>>,
    /// Admin only; the public listing always shows visible podcasts.
    pub is_visible: Option<bool>,
    #[serde(rename = "sortBy")]
    pub sort_by: Option<PodcastSort>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<SortOrder>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

/// What a channel sync changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PodcastSyncCounts {
    pub added: u64,
    pub updated: u64,
    pub removed: u64,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn video_id_shape() {
        assert!(is_youtube_video_id("dQw4w9WgXcQ"));
        assert!(is_youtube_video_id("a_b-c_d-e_f"));
        assert!(!is_youtube_video_id("dQw4w9WgXc"));
        assert!(!is_youtube_video_id("dQw4w9WgXc!"));
    }

    #[test]
    fn create_defaults_to_visible() {
        let req: CreatePodcastRequest = serde_json::from_value(json!({
            "youtube_video_id": "dQw4w9WgXcQ",
            "title": "Episode 1",
            "published_at": "2025-01-10T10:00:00Z"
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        assert!(req.is_visible);
        assert_eq!(req.view_count, 0);
    }

    #[test]
    fn sort_parses_from_query_names() {
        let sort: PodcastSort = serde_json::from_value(json!("view_count")).unwrap();
        assert_eq!(sort.column(), "view_count");
        assert_eq!(SortOrder::default().sql(), "DESC");
    }
}
