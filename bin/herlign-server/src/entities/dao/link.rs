use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A row in the `links` table.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Link {
    pub id: String,
    pub name: String,
    pub href: String,
    pub category: String,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
