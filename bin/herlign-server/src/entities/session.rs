use std::future::Future;

use chrono::{DateTime, Utc};
use herlign_core::{ChatMode, ModeTransition, PageParams};
use sqlx::{QueryBuilder, Sqlite};

use crate::entities::{db_time, dao::ChatSession, Store};

pub trait SessionStore: Send + Sync + 'static {
    fn create_session(&self, session: &ChatSession) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_session(&self, id: &str) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Newest session for `ip_hash` that has not expired at `now`.
    fn find_active_session(
        &self,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Non-expired sessions, most recent activity first.
    fn list_active_sessions(
        &self,
        mode: Option<ChatMode>,
        now: DateTime<Utc>,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<ChatSession>, i64), sqlx::Error>> + Send;
    fn apply_mode_transition(
        &self,
        id: &str,
        transition: &ModeTransition,
    ) -> impl Future<Output = Result<Option<ChatSession>, sqlx::Error>> + Send;
    /// Deletes sessions whose `expires_at` is before `now`; messages cascade.
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl SessionStore for Store {
    async fn create_session(&self, session: &ChatSession) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO chat_sessions \
             (id, guest_ip_hash, current_mode, admin_id, last_message_at, created_at, expires_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&session.id)
        .bind(&session.guest_ip_hash)
        .bind(session.current_mode.as_str())
        .bind(&session.admin_id)
        .bind(db_time(session.last_message_at))
        .bind(db_time(session.created_at))
        .bind(db_time(session.expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM chat_sessions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn find_active_session(
        &self,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<ChatSession>, sqlx::Error> {
        sqlx::query_as(
            "SELECT * FROM chat_sessions \
             WHERE guest_ip_hash = ?1 AND expires_at > ?2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(ip_hash)
        .bind(db_time(now))
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_active_sessions(
        &self,
        mode: Option<ChatMode>,
        now: DateTime<Utc>,
        page: PageParams,
    ) -> Result<(Vec<ChatSession>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM chat_sessions");
        push_active_filter(&mut count, mode, now);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM chat_sessions");
        push_active_filter(&mut select, mode, now);
        select
            .push(" ORDER BY last_message_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    async fn apply_mode_transition(
        &self,
        id: &str,
        transition: &ModeTransition,
    ) -> Result<Option<ChatSession>, sqlx::Error> {
        sqlx::query_as(
            "UPDATE chat_sessions SET current_mode = ?1, admin_id = ?2 WHERE id = ?3 RETURNING *",
        )
        .bind(transition.mode.as_str())
        .bind(&transition.admin_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM chat_sessions WHERE expires_at < ?1")
            .bind(db_time(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_active_filter(qb: &mut QueryBuilder<'_, Sqlite>, mode: Option<ChatMode>, now: DateTime<Utc>) {
    qb.push(" WHERE expires_at > ").push_bind(db_time(now));
    if let Some(mode) = mode {
        qb.push(" AND current_mode = ").push_bind(mode.as_str());
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use chrono::Duration;
    use herlign_core::chat::transition;
    use uuid::Uuid;

    pub(crate) fn session(ip_hash: &str, created_at: DateTime<Utc>, ttl_days: i64) -> ChatSession {
        ChatSession {
            id: Uuid::new_v4().to_string(),
            guest_ip_hash: ip_hash.to_owned(),
            current_mode: ChatMode::Auto,
            admin_id: None,
            last_message_at: created_at,
            created_at,
            expires_at: created_at + Duration::days(ttl_days),
        }
    }

    #[tokio::test]
    async fn active_lookup_ignores_expired() {
        let store = Store::in_memory().await;
        let now = Utc::now();
        let old = session("h1", now - Duration::days(40), 30);
        store.create_session(&old).await.unwrap();
        assert!(store.find_active_session("h1", now).await.unwrap().is_none());

        let fresh = session("h1", now, 30);
        store.create_session(&fresh).await.unwrap();
        let found = store.find_active_session("h1", now).await.unwrap().unwrap();
        assert_eq!(found.id, fresh.id);
        assert_eq!(found.current_mode, ChatMode::Auto);
    }

    #[tokio::test]
    async fn mode_transition_round_trip() {
        let store = Store::in_memory().await;
        let s = session("h2", Utc::now(), 30);
        store.create_session(&s).await.unwrap();

        let live = transition(ChatMode::Live, Some("admin-7")).unwrap();
        let updated = store.apply_mode_transition(&s.id, &live).await.unwrap().unwrap();
        assert_eq!(updated.current_mode, ChatMode::Live);
        assert_eq!(updated.admin_id.as_deref(), Some("admin-7"));

        let auto = transition(ChatMode::Auto, None).unwrap();
        let updated = store.apply_mode_transition(&s.id, &auto).await.unwrap().unwrap();
        assert_eq!(updated.current_mode, ChatMode::Auto);
        assert_eq!(updated.admin_id, None);

        assert!(store.apply_mode_transition("missing", &auto).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_sessions_are_deleted() {
        let store = Store::in_memory().await;
        let now = Utc::now();
        store.create_session(&session("a", now - Duration::days(31), 30)).await.unwrap();
        store.create_session(&session("b", now - Duration::days(45), 30)).await.unwrap();
        store.create_session(&session("c", now, 30)).await.unwrap();

        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 2);
        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 0);
        let (rows, total) = store
            .list_active_sessions(None, now, PageParams::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].guest_ip_hash, "c");
    }

    #[tokio::test]
    async fn list_filters_by_mode() {
        let store = Store::in_memory().await;
        let now = Utc::now();
        let a = session("a", now, 30);
        let b = session("b", now, 30);
        store.create_session(&a).await.unwrap();
        store.create_session(&b).await.unwrap();
        let live = transition(ChatMode::Live, Some("admin")).unwrap();
        store.apply_mode_transition(&b.id, &live).await.unwrap();

        let (rows, total) = store
            .list_active_sessions(Some(ChatMode::Live), now, PageParams::default())
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(rows[0].id, b.id);
    }
}
