use std::future::Future;

use chrono::Utc;
use herlign_core::PageParams;
use sqlx::{QueryBuilder, Sqlite};

use crate::entities::dao::Testimonial;
use crate::entities::{db_time, Store};
use crate::schemas::testimonial::UpdateTestimonialRequest;

#[derive(Debug, Clone, Default)]
pub struct TestimonialFilter {
    pub rating: Option<i64>,
    pub is_approved: Option<bool>,
}

pub trait TestimonialStore: Send + Sync + 'static {
    fn insert_testimonial(&self, testimonial: &Testimonial) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    fn get_testimonial(&self, id: &str) -> impl Future<Output = Result<Option<Testimonial>, sqlx::Error>> + Send;
    fn update_testimonial(
        &self,
        id: &str,
        patch: &UpdateTestimonialRequest,
    ) -> impl Future<Output = Result<Option<Testimonial>, sqlx::Error>> + Send;
    fn approve_testimonial(&self, id: &str) -> impl Future<Output = Result<Option<Testimonial>, sqlx::Error>> + Send;
    /// Returns the removed row so its avatar reference can be released.
    fn delete_testimonial(&self, id: &str) -> impl Future<Output = Result<Option<Testimonial>, sqlx::Error>> + Send;
    fn list_testimonials(
        &self,
        filter: &TestimonialFilter,
        page: PageParams,
    ) -> impl Future<Output = Result<(Vec<Testimonial>, i64), sqlx::Error>> + Send;
}

impl TestimonialStore for Store {
    async fn insert_testimonial(&self, t: &Testimonial) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO testimonials (id, rating, avatar_url, review, reviewer_name, reviewer_title, \
             is_approved, admin_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )
        .bind(&t.id)
        .bind(t.rating)
        .bind(&t.avatar_url)
        .bind(&t.review)
        .bind(&t.reviewer_name)
        .bind(&t.reviewer_title)
        .bind(t.is_approved)
        .bind(&t.admin_id)
        .bind(db_time(t.created_at))
        .bind(db_time(t.updated_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_testimonial(&self, id: &str) -> Result<Option<Testimonial>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM testimonials WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn update_testimonial(
        &self,
        id: &str,
        patch: &UpdateTestimonialRequest,
    ) -> Result<Option<Testimonial>, sqlx::Error> {
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE testimonials SET ");
        let mut set = qb.separated(", ");
        if let Some(v) = patch.rating {
            set.push("rating = ").push_bind_unseparated(v);
        }
        if let Some(v) = &patch.avatar_url {
            set.push("avatar_url = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.review {
            set.push("review = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.reviewer_name {
            set.push("reviewer_name = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = &patch.reviewer_title {
            set.push("reviewer_title = ").push_bind_unseparated(v.clone());
        }
        if let Some(v) = patch.is_approved {
            set.push("is_approved = ").push_bind_unseparated(v);
        }
        set.push("updated_at = ").push_bind_unseparated(db_time(Utc::now()));

        qb.push(" WHERE id = ").push_bind(id.to_owned()).push(" RETURNING *");
        qb.build_query_as().fetch_optional(&self.pool).await
    }

    async fn approve_testimonial(&self, id: &str) -> Result<Option<Testimonial>, sqlx::Error> {
        sqlx::query_as("UPDATE testimonials SET is_approved = 1, updated_at = ?1 WHERE id = ?2 RETURNING *")
            .bind(db_time(Utc::now()))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_testimonial(&self, id: &str) -> Result<Option<Testimonial>, sqlx::Error> {
        sqlx::query_as("DELETE FROM testimonials WHERE id = ?1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn list_testimonials(
        &self,
        filter: &TestimonialFilter,
        page: PageParams,
    ) -> Result<(Vec<Testimonial>, i64), sqlx::Error> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM testimonials WHERE 1 = 1");
        push_testimonial_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::new("SELECT * FROM testimonials WHERE 1 = 1");
        push_testimonial_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(page.limit_i64())
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build_query_as().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }
}

fn push_testimonial_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &TestimonialFilter) {
    if let Some(v) = filter.rating {
        qb.push(" AND rating = ").push_bind(v);
    }
    if let Some(v) = filter.is_approved {
        qb.push(" AND is_approved = ").push_bind(v);
    }
}
