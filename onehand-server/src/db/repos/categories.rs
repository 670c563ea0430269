//! Category repository (read-only)

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Category record
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Fixed price ceiling for items in this category
    pub max_price: Option<i64>,
}

pub struct CategoryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All categories, alphabetical.
    pub async fn list(&self) -> Result<Vec<Category>, DbError> {
        let categories = sqlx::query_as("SELECT id, name, max_price FROM categories ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn get(&self, id: i64) -> Result<Category, DbError> {
        sqlx::query_as("SELECT id, name, max_price FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("category", id))
    }
}
