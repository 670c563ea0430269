//! User repository

use chrono::{DateTime, Utc};
use onehand_core::Email;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{conflict_on_unique, DbError};

/// Public user record (no password hash)
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lookup result for sign-in
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a user; a taken email is a `Conflict`.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
        display_name: Option<&str>,
    ) -> Result<User, DbError> {
        sqlx::query_as(
            r#"
            INSERT INTO users (email, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING id, email, display_name, phone, created_at
            "#,
        )
        .bind(email.as_str())
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "user"))
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        sqlx::query_as("SELECT id, email, display_name, phone, created_at FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn find_credentials(&self, email: &Email) -> Result<Option<UserCredentials>, DbError> {
        let creds = sqlx::query_as("SELECT id, email, password_hash FROM users WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(self.pool)
            .await?;
        Ok(creds)
    }

    pub async fn get_credentials(&self, id: Uuid) -> Result<UserCredentials, DbError> {
        sqlx::query_as("SELECT id, email, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", id))
    }

    /// Store a new password hash. With `current` set, the write only lands
    /// while the stored hash still equals it. Returns whether a row changed.
    pub async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        current: Option<&str>,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET password_hash = $2
            WHERE id = $1 AND ($3::TEXT IS NULL OR password_hash = $3)
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .bind(current)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
