use std::future::Future;

use chrono::Utc;
use herlign_core::PageParams;
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite};

use crate::entities::dao::{Resource, ResourceFormat};
use crate::entities::{db_time, push_search, push_tags_overlap, Store};
use crate::schemas::resource::UpdateResourceRequest;

#[derive(Debug, Clone, Default)]
pub struct ResourceFilter {
    pub format: Option<ResourceFormat>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub search: Option<String>,
}

pub trait ResourceStore: Send + Sync + 'static {
    fn insert_resource(&self, resource: &Resource) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_resource(&self, id: &str) -> impl Future<Output = Result<Option<Resource>, sqlx::Error>> + Send;
    fn update_resource(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdateResourceRequest,
    ) -> impl Future<Output = Result<Option<Resource>, sqlx::Error>> + Send;
    fn delete_resource(&self, id: &str, admin_id: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    /// Newest first.
    fn list_resources(
        &self,
        filter: &ResourceFilter,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Resource>, i64), sqlx::Error>> + Send;
}

impl ResourceStore for Store {
    async fn insert_resource(&self, resource: &Resource) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO resources (id, title, description, external_link, format, category, tags, price, \
             is_paid, admin_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        )
        .bind(&resource.id)
        .bind(&resource.title)
        .bind(&resource.description)
        .bind(&resource.external_link)
        .bind(resource.format)
        .bind(&resource.category)
        .bind(Json(&resource.tags))
        .bind(resource.price)
        .bind(resource.is_paid)
        .bind(&resource.admin_id)
        .bind(db_time(resource.created_at))
        .bind(db_time(resource.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_resource(&self, id: &str) -> Result<Option<Resource>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM resources WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_resource(
        &self,
        id: &str,
        admin_id: &str,
        patch: &UpdateResourceRequest,
    ) -> Result<Option<Resource>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE resources SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = &patch.title {
            set.push("title = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.description {
            set.push("description = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.external_link {
            set.push("external_link = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.format {
            set.push("format = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.category {
            set.push("category = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.tags {
            set.push("tags = ").push_bind_unseparated(Json(v.clone()));
        }
        if let Some(v) = patch.price {
            set.push("price = ").push_bind_unseparated(v);
        }
        if let Some(v) = patch.is_paid {
            set.push("is_paid = ").push_bind_unseparated(v);
        }
        set.push("updated_at = ").push_bind_unseparated(db_time(Utc::now()));

        qb.push(" WHERE id = ")
            .push_bind(id.to_owned())
            .push(" AND admin_id = ")
            .push_bind(admin_id.to_owned())
            .push(" RETURNING *");
        qb.build_query_as().fetch_optional(&self.pool).await
    }

    async fn delete_resource(&self, id: &str, admin_id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM resources WHERE id = ?1 AND admin_id = ?2")
            .bind(id)
            .bind(admin_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_resources(
        &self,
        filter: &ResourceFilter,
        page: PageParams,
    ) -> Result<(Vec<Resource>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM resources WHERE 1 = 1");
        push_resource_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM resources WHERE 1 = 1");
        push_resource_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}

fn push_resource_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ResourceFilter) {
    if let Some(v) = filter.format {
        qb.push(" AND format = ").push_bind(v);
    }
    if let Some(v) = &filter.category {
        qb.push(" AND category = ").push_bind(v.clone());
    }
    push_tags_overlap(qb, "resources.tags", &filter.tags);
    if let Some(term) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        push_search(qb, &["title", "description"], term);
    }
}
