use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, sqlx::Type, Display)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceFormat {
    Ebook,
    Guide,
    Template,
}

/// A row in the `resources` table.
#[derive(Debug, Clone, Serialize, ToSchema, sqlx::FromRow)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub external_link: String,
    pub format: ResourceFormat,
    pub category: String,
    #[sqlx(json)]
    pub tags: Vec<String>,
    pub price: f64,
    pub is_paid: bool,
    pub admin_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
