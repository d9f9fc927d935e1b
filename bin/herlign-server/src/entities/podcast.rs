use std::collections::{HashMap, HashSet};
use std::future::Future;

use chrono::{DateTime, Utc};
use herlign_core::PageParams;
use sqlx::sqlite::SqliteArguments;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite};
use uuid::Uuid;

use crate::entities::dao::Podcast;
use crate::entities::{db_time, push_search, push_tags_overlap, Store};
use crate::schemas::podcast::{PodcastSort, PodcastSyncCounts, SortOrder, UpdatePodcastRequest};
use crate::youtube::YouTubeVideo;

#[derive(Debug, Clone, Default)]
pub struct PodcastFilter {
    pub search: Option<String>,
    pub tags: Vec<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub is_visible: Option<bool>,
    pub sort_by: PodcastSort,
    pub sort_order: SortOrder,
}

#[derive(Debug, Default)]
pub struct PodcastSyncOutcome {
    pub counts: PodcastSyncCounts,
    /// Thumbnails no longer referenced after the sync, for media bookkeeping.
    pub released_thumbnails: Vec<String>,
}

pub trait PodcastStore: Send + Sync + 'static {
    fn insert_podcast(&self, podcast: &Podcast) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_podcast(&self, id: &str) -> impl Future<Output = Result<Option<Podcast>, sqlx::Error>> + Send;
    fn video_id_taken(&self, youtube_video_id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Applies `patch` and records `admin_id` as the last editor.
    fn update_podcast(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdatePodcastRequest,
    ) -> impl Future<Output = Result<Option<Podcast>, sqlx::Error>> + Send;
    fn delete_podcast(&self, id: &str) -> impl Future<Output = Result<Option<Podcast>, sqlx::Error>> + Send;
    fn list_podcasts(
        &self,
        filter: &PodcastFilter,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Podcast>, i64), sqlx::Error>> + Send;
    /// Mirrors the channel in one transaction: inserts unknown videos,
    /// refreshes metadata of known ones (visibility is kept) and deletes
    /// podcasts whose video is no longer listed.
    fn sync_podcasts(
        &self,
        videos: &[YouTubeVideo],
        admin_id: &str,
    ) -> impl Future<Output = Result<PodcastSyncOutcome, sqlx::Error>> + Send;
}

impl PodcastStore for Store {
    async fn insert_podcast(&self, p: &Podcast) -> Result<(), sqlx::Error> {
        insert_query(p).execute(&self.pool).await?;
        Ok(())
    }

    async fn get_podcast(&self, id: &str) -> Result<Option<Podcast>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM podcasts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn video_id_taken(&self, youtube_video_id: &str) -> Result<bool, sqlx::Error> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM podcasts WHERE youtube_video_id = ?1")
            .bind(youtube_video_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    async fn update_podcast(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdatePodcastRequest,
    ) -> Result<Option<Podcast>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE podcasts SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &patch.title {
            set.push("title = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.description {
            set.push("description = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.thumbnail_url {
            set.push("thumbnail_url = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.published_at {
            set.push("published_at = ").push_bind_unseparated(db_time(v));
        }
        if let Some(v) = &patch.duration {
            set.push("duration = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.view_count {
            set.push("view_count = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.like_count {
            set.push("like_count = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.comment_count {
            set.push("comment_count = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.channel_title {
            set.push("channel_title = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.tags {
            set.push("tags = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = &patch.category_id {
            set.push("category_id = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.is_visible {
            set.push("is_visible = ").push_bind_unseparated(v);
        }
        set.push("admin_id = ").push_bind_unseparated(admin_id.to_owned());
        set.push("updated_at = ").push_bind_unseparated(db_time(Utc::now()));

        qb.push(" WHERE id = ").push_bind(id.to_owned()).push(" RETURNING *");
        qb.build_query_as().fetch_optional(&self.pool).await
    }

    async fn delete_podcast(&self, id: &str) -> Result<Option<Podcast>, sqlx::Error> {
        sqlx::query_as("DELETE FROM podcasts WHERE id = ?1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_podcasts(&self, filter: &PodcastFilter, page: PageParams) -> Result<(Vec<Podcast>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM podcasts WHERE 1 = 1");
        push_podcast_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM podcasts WHERE 1 = 1");
        push_podcast_filter(&mut select, filter);
        // Column and direction come from closed enums, never from raw input.
        select
            .push(" ORDER BY ")
            .push(filter.sort_by.column())
            .push(" ")
            .push(filter.sort_order.sql())
            .push(" LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    async fn sync_podcasts(&self, videos: &[YouTubeVideo], admin_id: &str) -> Result<PodcastSyncOutcome, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let existing: HashMap<String, Option<String>> =
            sqlx::query_as::<_, (String, Option<String>)>("SELECT youtube_video_id, thumbnail_url FROM podcasts")
                .fetch_all(&mut *tx)
                .await?
                .into_iter()
                .collect();

        let mut outcome = PodcastSyncOutcome::default();
        let mut seen = HashSet::new();
        let now = Utc::now();
        for video in videos {
            if !seen.insert(video.video_id.as_str()) {
                continue;
            }
            match existing.get(&video.video_id) {
                Some(old_thumbnail) => {
                    sqlx::query(
                        "UPDATE podcasts SET title = ?1, description = ?2, thumbnail_url = ?3, published_at = ?4, \
                         duration = ?5, view_count = ?6, like_count = ?7, comment_count = ?8, channel_title = ?9, \
                         tags = ?10, category_id = ?11, admin_id = ?12, updated_at = ?13 \
                         WHERE youtube_video_id = ?14",
                    )
                    .bind(&video.title)
                    .bind(&video.description)
                    .bind(&video.thumbnail_url)
                    .bind(db_time(video.published_at))
                    .bind(&video.duration)
                    .bind(video.view_count)
                    .bind(video.like_count)
                    .bind(video.comment_count)
                    .bind(&video.channel_title)
                    .bind(Json(&video.tags))
                    .bind(&video.category_id)
                    .bind(admin_id)
                    .bind(db_time(now))
                    .bind(&video.video_id)
                    .execute(&mut *tx)
                    .await?;
                    if let Some(old) = old_thumbnail.as_ref().filter(|old| video.thumbnail_url.as_ref() != Some(*old)) {
                        outcome.released_thumbnails.push(old.clone());
                    }
                    outcome.counts.updated += 1;
                }
                None => {
                    let podcast = podcast_from_video(video, admin_id, now);
                    insert_query(&podcast).execute(&mut *tx).await?;
                    outcome.counts.added += 1;
                }
            }
        }

        for (video_id, thumbnail) in &existing {
            if seen.contains(video_id.as_str()) {
                continue;
            }
            sqlx::query("DELETE FROM podcasts WHERE youtube_video_id = ?1")
                .bind(video_id)
                .execute(&mut *tx)
                .await?;
            outcome.released_thumbnails.extend(thumbnail.clone());
            outcome.counts.removed += 1;
        }

        tx.commit().await?;
        Ok(outcome)
    }
}

fn insert_query(p: &Podcast) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
    sqlx::query(
        "INSERT INTO podcasts (id, youtube_video_id, title, description, thumbnail_url, published_at, duration, \
         view_count, like_count, comment_count, channel_title, tags, category_id, is_visible, admin_id, \
         created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
    )
    .bind(&p.id)
    .bind(&p.youtube_video_id)
    .bind(&p.title)
    .bind(&p.description)
    .bind(&p.thumbnail_url)
    .bind(db_time(p.published_at))
    .bind(&p.duration)
    .bind(p.view_count)
    .bind(p.like_count)
    .bind(p.comment_count)
    .bind(&p.channel_title)
    .bind(Json(&p.tags))
    .bind(&p.category_id)
    .bind(p.is_visible)
    .bind(&p.admin_id)
    .bind(db_time(p.created_at))
    .bind(db_time(p.updated_at))
}

/// New catalogue entry for a synced video; synced videos start visible.
fn podcast_from_video(video: &YouTubeVideo, admin_id: &str, now: DateTime<Utc>) -> Podcast {
    Podcast {
        id: Uuid::new_v4().to_string(),
        youtube_video_id: video.video_id.clone(),
        title: video.title.clone(),
        description: video.description.clone(),
        thumbnail_url: video.thumbnail_url.clone(),
        published_at: video.published_at,
        duration: video.duration.clone(),
        view_count: video.view_count,
        like_count: video.like_count,
        comment_count: video.comment_count,
        channel_title: video.channel_title.clone(),
        tags: video.tags.clone(),
        category_id: video.category_id.clone(),
        is_visible: true,
        admin_id: admin_id.to_owned(),
        created_at: now,
        updated_at: now,
    }
}

fn push_podcast_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &PodcastFilter) {
    if let Some(v) = filter.is_visible {
        qb.push(" AND is_visible = ").push_bind(v);
    }
    if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        push_search(qb, &["title", "description"], term);
    }
    push_tags_overlap(qb, "podcasts.tags", &filter.tags);
    if let Some(v) = filter.date_from {
        qb.push(" AND published_at >= ").push_bind(db_time(v));
    }
    if let Some(v) = filter.date_to {
        qb.push(" AND published_at <= ").push_bind(db_time(v));
    }
}
