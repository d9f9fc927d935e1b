use std::future::Future;

use chrono::Utc;
use herlign_core::PageParams;
use sqlx::{QueryBuilder, Sqlite};

use crate::entities::dao::Link;
use crate::entities::{db_time, Store};
use crate::schemas::link::UpdateLinkRequest;

pub trait LinkStore: Send + Sync + 'static {
    fn insert_link(&self, link: &Link) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_link(&self, id: &str) -> impl Future<Output = Result<Option<Link>, sqlx::Error>> + Send;
    fn update_link(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdateLinkRequest,
    ) -> impl Future<Output = Result<Option<Link>, sqlx::Error>> + Send;
    fn delete_link(&self, id: &str, admin_id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    fn list_links(
        &self,
        category: Option<&str>,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Link>, i64), sqlx::Error>> + Send;
}

impl LinkStore for Store {
    async fn insert_link(&self, link: &Link) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO links (id, name, href, category, admin_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&link.id)
        .bind(&link.name)
        .bind(&link.href)
        .bind(&link.category)
        .bind(&link.admin_id)
        .bind(db_time(link.created_at))
        .bind(db_time(link.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_link(&self, id: &str) -> Result<Option<Link>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM links WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_link(&self, id: &str, admin_id: &str, patch: &UpdateLinkRequest) -> Result<Option<Link>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE links SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &patch.name {
            set.push("name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.href {
            set.push("href = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.category {
            set.push("category = ").push_bind_unseparated(v.clone());
        }
        set.push("updated_at = ").push_bind_unseparated(db_time(Utc::now()));

        qb.push(" WHERE id = ")
            .push_bind(id.to_owned())
            .push(" AND admin_id = ")
            .push_bind(admin_id.to_owned())
            .push(" RETURNING *");
        qb.build_query_as().fetch_optional(&self.pool).await
    }

    async fn delete_link(&self, id: &str, admin_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?1 AND admin_id = ?2")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_links(&self, category: Option<&str>, page: PageParams) -> Result<(Vec<Link>, i64), sqlx::Error> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM links WHERE ?1 IS NULL OR category = ?1")
            .bind(category)
            .fetch_one(&self.pool)
            .await?;
        let rows = sqlx::query_as(
            "SELECT * FROM links WHERE ?1 IS NULL OR category = ?1 \
             ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(category)
        .bind(page.limit_i64())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;
        Ok((rows, total))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use uuid::Uuid;

    fn link(name: &str, category: &str) -> Link {
        let now = Utc::now();
        Link {
            id: Uuid::new_v4().to_string(),
            name: name.to_owned(),
            href: "https://herlign.com".into(),
            category: category.to_owned(),
            admin_id: "owner".into(),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn category_filter_and_paging() {
        let store = Store::in_memory().await;
        for i in 0..3 {
            store.insert_link(&link(&format!("social {i}"), "social")).await.unwrap();
        }
        store.insert_link(&link("docs", "docs")).await.unwrap();

        let page = PageParams::new(Some(2), Some(2)).unwrap();
        let (rows, total) = store.list_links(Some("social"), page).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(rows.len(), 1);

        let (_, total) = store.list_links(None, PageParams::default()).await.unwrap();
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn update_requires_owner() {
        let store = Store::in_memory().await;
        let l = link("Instagram", "social");
        store.insert_link(&l).await.unwrap();
        let patch = UpdateLinkRequest { name: Some("IG".into()), ..Default::default() };
        assert!(store.update_link(&l.id, "other", &patch).await.unwrap().is_none());
        let updated = store.update_link(&l.id, "owner", &patch).await.unwrap().unwrap();
        assert_eq!(updated.name, "IG");
    }
}
