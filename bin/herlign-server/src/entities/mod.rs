//! Persistence layer.
//!
//! Each domain gets its own store trait (`SessionStore`, `EventStore`, ...)
//! and [`Store`] implements all of them on top of one SQLite pool. Trait
//! methods use `impl Future` in their signatures so no `async-trait` is
//! needed here.
//!
//! Queries use the runtime-checked `sqlx::query*` forms, so no
//! `DATABASE_URL` is required at compile time.

pub mod admin;
pub mod chat;
pub mod dao;
pub mod dashboard;
pub mod event;
pub mod link;
pub mod media;
pub mod podcast;
pub mod resource;
pub mod session;
pub mod testimonial;

pub use admin::AdminStore;
pub use chat::ChatStore;
pub use dashboard::DashboardStore;
pub use event::EventStore;
pub use link::LinkStore;
pub use media::{sync_media_usage, MediaStore};
pub use podcast::PodcastStore;
pub use resource::ResourceStore;
pub use session::SessionStore;
pub use testimonial::TestimonialStore;

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

#[derive(Clone, Debug)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the SQLite database at `url` and run pending migrations.
    ///
    /// `url` is a sqlx SQLite URL, e.g. `"sqlite://herlign.db?mode=rwc"`.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        // Path is resolved relative to CARGO_MANIFEST_DIR at compile time.
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Fresh in-memory database. A single connection that never idles out,
    /// otherwise every new connection would see an empty database.
    #[cfg(test)]
    pub async fn in_memory() -> Self {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .expect("in-memory url")
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .expect("open in-memory sqlite");
        sqlx::migrate!("./migrations").run(&pool).await.expect("migrations");
        Self { pool }
    }
}

/// Canonical text form for timestamp columns: fixed microsecond precision
/// with a `Z` suffix, so string order equals time order.
pub fn db_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Appends `AND (<col> LIKE %term% OR ...)` for a free-text search.
pub(crate) fn push_search(qb: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], term: &str) {
    let pattern = format!("%{}%", term.trim());
    qb.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push(*column).push(" LIKE ").push_bind(pattern.clone());
    }
    qb.push(")");
}

/// Appends a tag-overlap condition: at least one of `tags` appears in the
/// JSON array stored in `column`.
pub(crate) fn push_tags_overlap(qb: &mut QueryBuilder<'_, Sqlite>, column: &str, tags: &[String]) {
    if tags.is_empty() {
        return;
    }
    qb.push(" AND EXISTS (SELECT 1 FROM json_each(")
        .push(column)
        .push(") WHERE json_each.value IN (");
    let mut values = qb.separated(", ");
    for tag in tags {
        values.push_bind(tag.clone());
    }
    qb.push("))");
}

/// Splits a comma-separated `tags` query value.
pub fn parse_tag_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn db_time_has_fixed_width() {
        let a = Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap();
        let b = a + chrono::Duration::microseconds(1500);
        assert_eq!(db_time(a), "2025-03-01T12:00:00.000000Z");
        assert_eq!(db_time(b), "2025-03-01T12:00:00.001500Z");
        assert!(db_time(a) < db_time(b));
    }

    #[test]
    fn tag_list_is_trimmed() {
        assert_eq!(parse_tag_list(Some("career, , growth ")), vec!["career", "growth"]);
        assert!(parse_tag_list(None).is_empty());
    }

    #[tokio::test]
    async fn migrations_apply_in_memory() {
        let store = Store::in_memory().await;
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM chat_sessions")
            .fetch_one(&store.pool)
            .await
            .unwrap();
        assert_eq!(n, 0);
    }
}
