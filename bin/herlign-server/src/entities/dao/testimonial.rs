use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A row in the `testimonials` table.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Testimonial {
    pub id: String,
    pub rating: Option<i64>,
    pub avatar_url: Option<String>,
    pub review: String,
    pub reviewer_name: String,
    pub reviewer_title: Option<String>,
    pub is_approved: bool,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
