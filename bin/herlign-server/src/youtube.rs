//! YouTube Data API client used by the podcast sync.
//!
//! [`VideoSource`] is the seam the sync handler talks to; the real
//! implementation is [`YouTubeClient`], tests plug in a fake.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::config::YouTubeConfig;

/// Largest page `playlistItems` hands out, and the most ids `videos` accepts.
const PAGE_SIZE: &str = "50";

/// Channel video metadata, flattened from the API's snippet, details and statistics parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YouTubeVideo {
    pub video_id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub duration: Option<String>,
    pub view_count: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub channel_title: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum YouTubeError {
    #[error("YouTube API key or channel ID not configured")]
    NotConfigured,

    #[error("Could not find uploads playlist")]
    NoUploadsPlaylist,

    #[error("YouTube request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("YouTube {endpoint} returned HTTP {status}")]
    Status {
        endpoint: &'static str,
        status: reqwest::StatusCode,
    },

    #[error("invalid YouTube API URL: {0}")]
    BadUrl(String),
}

#[async_trait]
pub trait VideoSource: Send + Sync {
    /// Every public upload on the configured channel.
    async fn channel_videos(&self) -> Result<Vec<YouTubeVideo>, YouTubeError>;
}

pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
    channel_id: Option<String>,
    base_url: String,
}

impl YouTubeClient {
    pub fn new(cfg: &YouTubeConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .context("failed to build YouTube HTTP client")?;
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            channel_id: cfg.channel_id.clone(),
            base_url: cfg.api_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.channel_id.is_some()
    }

    fn endpoint_url(&self, endpoint: &str, api_key: &str, params: &[(&str, &str)]) -> Result<Url, YouTubeError> {
        let mut url = Url::parse_with_params(&format!("{}/{endpoint}", self.base_url), params)
            .map_err(|e| YouTubeError::BadUrl(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", api_key);
        Ok(url)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        api_key: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = self.endpoint_url(endpoint, api_key, params)?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(YouTubeError::Status { endpoint, status });
        }
        Ok(response.json().await?)
    }

    async fn uploads_playlist(&self, api_key: &str, channel_id: &str) -> Result<String, YouTubeError> {
        let channels: Page<ChannelResource> = self
            .fetch("channels", api_key, &[("part", "contentDetails"), ("id", channel_id)])
            .await?;
        channels
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .and_then(|d| d.related_playlists.uploads)
            .ok_or(YouTubeError::NoUploadsPlaylist)
    }
}

#[async_trait]
impl VideoSource for YouTubeClient {
    async fn channel_videos(&self) -> Result<Vec<YouTubeVideo>, YouTubeError> {
        let (Some(api_key), Some(channel_id)) = (self.api_key.as_deref(), self.channel_id.as_deref()) else {
            return Err(YouTubeError::NotConfigured);
        };
        let playlist = self.uploads_playlist(api_key, channel_id).await?;

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut params = vec![
                ("part", "snippet,contentDetails"),
                ("playlistId", playlist.as_str()),
                ("maxResults", PAGE_SIZE),
            ];
            if let Some(token) = page_token.as_deref() {
                params.push(("pageToken", token));
            }
            let items: Page<PlaylistItemResource> = self.fetch("playlistItems", api_key, &params).await?;

            let ids = items
                .items
                .iter()
                .map(|i| i.content_details.video_id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            if !ids.is_empty() {
                let details: Page<VideoResource> = self
                    .fetch(
                        "videos",
                        api_key,
                        &[("part", "snippet,contentDetails,statistics"), ("id", ids.as_str())],
                    )
                    .await?;
                videos.extend(details.items.into_iter().map(YouTubeVideo::from));
            }
            debug!(fetched = videos.len(), "fetched a page of channel uploads");

            match items.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(videos)
    }
}

// ── wire types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Page<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelResource {
    content_details: Option<ChannelDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemResource {
    content_details: PlaylistItemDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    snippet: VideoSnippet,
    content_details: Option<VideoDetails>,
    statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    description: Option<String>,
    published_at: DateTime<Utc>,
    thumbnails: Option<Thumbnails>,
    channel_title: Option<String>,
    tags: Option<Vec<String>>,
    category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnails {
    high: Option<Thumbnail>,
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct VideoDetails {
    duration: Option<String>,
}

/// The API reports counters as decimal strings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

fn count(value: Option<&str>) -> i64 {
    value.and_then(|v| v.parse().ok()).unwrap_or(0)
}

impl From<VideoResource> for YouTubeVideo {
    fn from(v: VideoResource) -> Self {
        let snippet = v.snippet;
        let stats = v.statistics.unwrap_or_default();
        let thumbnail_url = snippet
            .thumbnails
            .and_then(|t| t.high.or(t.medium).or(t.default))
            .map(|t| t.url);
        Self {
            video_id: v.id,
            title: snippet.title,
            description: snippet.description.filter(|d| !d.is_empty()),
            thumbnail_url,
            published_at: snippet.published_at,
            duration: v.content_details.and_then(|d| d.duration),
            view_count: count(stats.view_count.as_deref()),
            like_count: count(stats.like_count.as_deref()),
            comment_count: count(stats.comment_count.as_deref()),
            channel_title: snippet.channel_title,
            tags: snippet.tags.unwrap_or_default(),
            category_id: snippet.category_id,
        }
    }
}
