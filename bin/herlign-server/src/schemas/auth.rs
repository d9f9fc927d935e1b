use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::entities::dao::AdminUser;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub message: String,
    /// Opaque bearer token for `/api/admin/*`.
    pub token: String,
    pub expires_at: String,
    pub user: AdminUser,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionStatusResponse {
    pub authenticated: bool,
    pub user: Option<AdminUser>,
}
