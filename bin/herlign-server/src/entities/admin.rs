use std::future::Future;

use chrono::{DateTime, Utc};
use herlign_core::identity::hash_password;
use uuid::Uuid;

use crate::entities::dao::{Admin, AdminUser};
use crate::entities::{db_time, Store};

pub trait AdminStore: Send + Sync + 'static {
    fn find_admin_by_email(&self, email: &str) -> impl Future<Output = Result<Option<Admin>, sqlx::Error>> + Send;
    /// Creates an admin, storing an Argon2 hash of `password`.
    fn create_admin(&self, email: &str, password: &str) -> impl Future<Output = Result<Admin, sqlx::Error>> + Send;
    fn insert_token(
        &self,
        token: &str,
        admin_id: &str,
        expires_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<(), sqlx::Error>> + Send;
    /// Admin owning `token`, provided the token has not expired at `now`.
    fn find_admin_by_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<Option<AdminUser>, sqlx::Error>> + Send;
    fn revoke_token(&self, token: &str) -> impl Future<Output = Result<bool, sqlx::Error>> + Send;
    fn delete_expired_tokens(&self, now: DateTime<Utc>) -> impl Future<Output = Result<u64, sqlx::Error>> + Send;
}

impl AdminStore for Store {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM admins WHERE email = ?1 COLLATE NOCASE")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
    }

    async fn create_admin(&self, email: &str, password: &str) -> Result<Admin, sqlx::Error> {
        let password_hash = hash_password(password).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let admin = Admin {
            id: Uuid::new_v4().to_string(),
            email: email.trim().to_lowercase(),
            password_hash,
            created_at: Utc::now(),
        };
        sqlx::query("INSERT INTO admins (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)")
            .bind(&admin.id)
            .bind(&admin.email)
            .bind(&admin.password_hash)
            .bind(db_time(admin.created_at))
            .execute(&self.pool)
            .await?;
        Ok(admin)
    }

    async fn insert_token(&self, token: &str, admin_id: &str, expires_at: DateTime<Utc>) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO admin_tokens (token, admin_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(token)
        .bind(admin_id)
        .bind(db_time(Utc::now()))
        .bind(db_time(expires_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_admin_by_token(&self, token: &str, now: DateTime<Utc>) -> Result<Option<AdminUser>, sqlx::Error> {
        sqlx::query_as(
            "SELECT a.id, a.email FROM admin_tokens t JOIN admins a ON a.id = t.admin_id \
             WHERE t.token = ?1 AND t.expires_at > ?2",
        )
        .bind(token)
        .bind(db_time(now))
        .fetch_optional(&self.pool)
        .await
    }

    async fn revoke_token(&self, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admin_tokens WHERE token = ?1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM admin_tokens WHERE expires_at < ?1")
            .bind(db_time(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
