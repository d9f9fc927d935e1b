use std::future::Future;

use chrono::{DateTime, Utc};
use herlign_core::PageParams;
use sqlx::{QueryBuilder, Sqlite};

use crate::entities::dao::{Event, EventMode, EventStatus, EventType};
use crate::entities::{db_time, push_search, Store};
use crate::schemas::event::UpdateEventRequest;

/// Conditions for [`EventStore::list_events`].
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub event_type: Option<EventType>,
    pub mode: Option<EventMode>,
    pub status: Option<EventStatus>,
    pub search: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    /// Keep only events whose `end_date` is at or after this instant.
    pub ending_after: Option<DateTime<Utc>>,
    /// Soonest first instead of latest first.
    pub ascending: bool,
}

pub trait EventStore: Send + Sync + 'static {
    fn insert_event(&self, event: &Event) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_event(&self, id: &str) -> impl Future<Output = Result<Option<Event>, sqlx::Error>> + Send;
    fn get_published_event_by_slug(&self, slug: &str) -> impl Future<Output = Result<Option<Event>, sqlx::Error>> + Send;
    /// Whether any event other than `exclude_id` already uses `slug`.
    fn slug_taken(&self, slug: &str, exclude_id: Option<&str>) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Applies the present fields of `patch` to an event owned by `admin_id`.
    fn update_event(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdateEventRequest,
        slug: Option<&str>,
    ) -> impl Future<Output = Result<Option<Event>, sqlx::Error>> + Send;
    /// Deletes an event owned by `admin_id`, returning the removed row.
    fn delete_event(&self, id: &str, admin_id: &str) -> impl Future<Output = Result<Option<Event>, sqlx::Error>> + Send;
    fn list_events(
        &self,
        filter: &EventFilter,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Event>, i64), sqlx::Error>> + Send;
}

impl EventStore for Store {
    async fn insert_event(&self, event: &Event) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO events (id, type, mode, title, slug, description, external_link, start_date, end_date, \
             max_attendees, image_url, price, is_paid, status, featured, admin_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )
        .bind(&event.id)
        .bind(event.event_type)
        .bind(event.mode)
        .bind(&event.title)
        .bind(&event.slug)
        .bind(&event.description)
        .bind(&event.external_link)
        .bind(db_time(event.start_date))
        .bind(db_time(event.end_date))
        .bind(event.max_attendees)
        .bind(&event.image_url)
        .bind(event.price)
        .bind(event.is_paid)
        .bind(event.status)
        .bind(event.featured)
        .bind(&event.admin_id)
        .bind(db_time(event.created_at))
        .bind(db_time(event.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_event(&self, id: &str) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_published_event_by_slug(&self, slug: &str) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM events WHERE slug = ?1 AND status = 'published'")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
    }

    async fn slug_taken(&self, slug: &str, exclude_id: Option<&str>) -> Result<bool, sqlx::Error> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM events WHERE slug = ?1 AND id != ?2")
            .bind(slug)
            .bind(exclude_id.unwrap_or(""))
            .fetch_one(&self.pool)
            .await?;
        Ok(n > 0)
    }

    async fn update_event(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdateEventRequest,
        slug: Option<&str>,
    ) -> Result<Option<Event>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE events SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = patch.event_type {
            set.push("type = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.mode {
            set.push("mode = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.title {
            set.push("title = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = slug {
            set.push("slug = ").push_bind_unseparated(v.to_owned());
        }
        if let Some(v) = &patch.description {
            set.push("description = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.external_link {
            set.push("external_link = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.start_date {
            set.push("start_date = ").push_bind_unseparated(db_time(v));
        }
        if let Some(v) = patch.end_date {
            set.push("end_date = ").push_bind_unseparated(db_time(v));
        }
        if let Some(v) = patch.max_attendees {
            set.push("max_attendees = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.image_url {
            set.push("image_url = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.price {
            set.push("price = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.is_paid {
            set.push("is_paid = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.status {
            set.push("status = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.featured {
            set.push("featured = ").push_bind_unseparated(v);
        }
        set.push("updated_at = ").push_bind_unseparated(db_time(Utc::now()));

        qb.push(" WHERE id = ")
            .push_bind(id.to_owned())
            .push(" AND admin_id = ")
            .push_bind(admin_id.to_owned())
            .push(" RETURNING *");
        qb.build_query_as().fetch_optional(&self.pool).await
    }

    async fn delete_event(&self, id: &str, admin_id: &str) -> Result<Option<Event>, sqlx::Error> {
        sqlx::query_as("DELETE FROM events WHERE id = ?1 AND admin_id = ?2 RETURNING *")
            .bind(id)
            .bind(admin_id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_events(&self, filter: &EventFilter, page: PageParams) -> Result<(Vec<Event>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM events WHERE 1 = 1");
        push_event_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM events WHERE 1 = 1");
        push_event_filter(&mut select, filter);
        select
            .push(" ORDER BY start_date ")
            .push(if filter.ascending { "ASC" } else { "DESC" })
            .push(" LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}

fn push_event_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &EventFilter) {
    if let Some(v) = filter.event_type {
        qb.push(" AND type = ").push_bind(v);
    }
    if let Some(v) = filter.mode {
        qb.push(" AND mode = ").push_bind(v);
    }
    if let Some(v) = filter.status {
        qb.push(" AND status = ").push_bind(v);
    }
    if let Some(v) = filter.featured {
        qb.push(" AND featured = ").push_bind(v);
    }
    if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        push_search(qb, &["title", "description"], term);
    }
    if let Some(v) = filter.date_from {
        qb.push(" AND start_date >= ").push_bind(db_time(v));
    }
    if let Some(v) = filter.date_to {
        qb.push(" AND start_date <= ").push_bind(db_time(v));
    }
    if let Some(v) = filter.ending_after {
        qb.push(" AND end_date >= ").push_bind(db_time(v));
    }
}
