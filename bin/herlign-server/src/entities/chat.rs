use std::future::Future;

use chrono::Utc;
use herlign_core::SenderType;
use uuid::Uuid;

use crate::entities::{db_time, dao::ChatMessage, Store};

pub trait ChatStore: Send + Sync + 'static {
    /// Stores a message and bumps the session's `last_message_at` in one
    /// transaction.
    fn append_message(
        &self,
        session_id: &str,
        sender: SenderType,
        content: &str,
    ) -> impl Future<Output = Result<ChatMessage, sqlx::Error>> + Send;
    /// Full history of a session in the order it was written.
    fn list_messages(&self, session_id: &str) -> impl Future<Output = Result<Vec<ChatMessage>, sqlx::Error>> + Send;
}

impl ChatStore for Store {
    async fn append_message(
        &self,
        session_id: &str,
        sender: SenderType,
        content: &str,
    ) -> Result<ChatMessage, sqlx::Error> {
        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_owned(),
            sender_type: sender,
            content: content.to_owned(),
            created_at: Utc::now(),
        };
        let created_at = db_time(message.created_at);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO chat_messages (id, session_id, sender_type, content, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&message.id)
        .bind(&message.session_id)
        .bind(sender.as_str())
        .bind(&message.content)
        .bind(&created_at)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE chat_sessions SET last_message_at = ?1 WHERE id = ?2")
            .bind(&created_at)
            .bind(session_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(message)
    }

    async fn list_messages(&self, session_id: &str) -> Result<Vec<ChatMessage>, sqlx::Error> {
        sqlx::query_as(
            "SELECT id, session_id, sender_type, content, created_at FROM chat_messages \
             WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::entities::session::test::session;
    use crate::entities::SessionStore;
    use chrono::Duration;

    #[tokio::test]
    async fn messages_keep_insertion_order_and_bump_activity() {
        let store = Store::in_memory().await;
        let start = Utc::now() - Duration::hours(1);
        let s = session("hash", start, 30);
        store.create_session(&s).await.unwrap();

        store.append_message(&s.id, SenderType::Guest, "hello").await.unwrap();
        store.append_message(&s.id, SenderType::Bot, "hi, how can I help?").await.unwrap();
        store.append_message(&s.id, SenderType::Admin, "taking over").await.unwrap();

        let history = store.list_messages(&s.id).await.unwrap();
        let senders: Vec<_> = history.iter().map(|m| m.sender_type).collect();
        assert_eq!(senders, [SenderType::Guest, SenderType::Bot, SenderType::Admin]);

        let reloaded = store.get_session(&s.id).await.unwrap().unwrap();
        assert!(reloaded.last_message_at > start);
    }

    #[tokio::test]
    async fn messages_cascade_with_session() {
        let store = Store::in_memory().await;
        let now = Utc::now();
        let s = session("gone", now - Duration::days(60), 30);
        store.create_session(&s).await.unwrap();
        store.append_message(&s.id, SenderType::Guest, "anyone there?").await.unwrap();

        store.delete_expired_sessions(now).await.unwrap();
        assert!(store.list_messages(&s.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_session_is_rejected() {
        let store = Store::in_memory().await;
        let err = store.append_message("nope", SenderType::Guest, "x").await;
        assert!(err.is_err());
    }
}
