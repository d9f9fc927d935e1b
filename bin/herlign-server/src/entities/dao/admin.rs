use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// A row in the `admins` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Admin {
    pub id: String,
    pub email: String,
    /// Argon2 PHC string.
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated admin behind a request. Inserted as a request
/// extension by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema, sqlx::FromRow)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
}

impl Admin {
    pub fn user(&self) -> AdminUser {
        AdminUser {
            id: self.id.clone(),
            email: self.email.clone(),
        }
    }
}
