use std::future::Future;

use herlign_core::media::use_count_deltas;
use herlign_core::PageParams;
use sqlx::{QueryBuilder, Sqlite};
use tracing::{debug, warn};

use crate::entities::{db_time, dao::Media, Store};

pub trait MediaStore: Send + Sync + 'static {
    fn insert_media(&self, media: &Media) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_media(&self, id: &str) -> impl Future<Output = Result<Option<Media>, sqlx::Error>> + Send;
    /// Newest first; `is_used` filters on `use_count > 0`.
    fn list_media(
        &self,
        is_used: Option<bool>,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Media>, i64), sqlx::Error>> + Send;
    /// Every unreferenced file, oldest first.
    fn list_unused_media(&self) -> impl Future<Output = Result<Vec<Media>, sqlx::Error>> + Send;
    fn delete_media(&self, id: &str, admin_id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Adds `delta` to the row with `url` in a single statement, never
    /// dropping below zero. Returns `false` when no row has that url.
    fn adjust_media_use_count(&self, url: &str, delta: i64) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
}

impl MediaStore for Store {
    async fn insert_media(&self, media: &Media) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO media (id, file_name, url, mime_type, size, alt_text, use_count, admin_id, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&media.id)
        .bind(&media.file_name)
        .bind(&media.url)
        .bind(&media.mime_type)
        .bind(media.size)
        .bind(&media.alt_text)
        .bind(media.use_count)
        .bind(&media.admin_id)
        .bind(db_time(media.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_media(&self, id: &str) -> Result<Option<Media>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM media WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_media(&self, is_used: Option<bool>, page: PageParams) -> Result<(Vec<Media>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM media");
        push_usage_filter(&mut count, is_used);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM media");
        push_usage_filter(&mut select, is_used);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    async fn list_unused_media(&self) -> Result<Vec<Media>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM media WHERE use_count = 0 ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await
    }

    async fn delete_media(&self, id: &str, admin_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM media WHERE id = ?1 AND admin_id = ?2")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_media_use_count(&self, url: &str, delta: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE media SET use_count = MAX(0, use_count + ?1) WHERE url = ?2")
            .bind(delta)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn push_usage_filter(qb: &mut QueryBuilder<'_, Sqlite>, is_used: Option<bool>) {
    match is_used {
        Some(true) => {
            qb.push(" WHERE use_count > 0");
        }
        Some(false) => {
            qb.push(" WHERE use_count = 0");
        }
        None => {}
    }
}

/// Moves media reference counts after a content field changed from `old`
/// to `new`. Failures are logged and never fail the content write.
pub async fn sync_media_usage<S: MediaStore>(store: &S, old: Option<&str>, new: Option<&str>) {
    for (url, delta) in use_count_deltas(old, new) {
        match store.adjust_media_use_count(&url, delta).await {
            Ok(true) => debug!(%url, delta, "media use count adjusted"),
            Ok(false) => warn!(%url, delta, "no media row for url; use count unchanged"),
            Err(e) => warn!(%url, delta, error = %e, "failed to adjust media use count"),
        }
    }
}
