//! Bookmark repository
//!
//! The (user_id, item_id) primary key makes `add` idempotent.

use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::items::Item;
use super::{missing_on_foreign_key, DbError};
use crate::models::{Paginated, Window};

#[derive(FromRow)]
struct BookmarkedItem {
    #[sqlx(flatten)]
    item: Item,
    total: i64,
}

pub struct BookmarkRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BookmarkRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Bookmark an item; bookmarking twice is a no-op.
    pub async fn add(&self, user: Uuid, item: Uuid) -> Result<(), DbError> {
        sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, item_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, item_id) DO NOTHING
            "#,
        )
        .bind(user)
        .bind(item)
        .execute(self.pool)
        .await
        .map_err(|e| missing_on_foreign_key(e, "item", item))?;
        Ok(())
    }

    /// Remove a bookmark (idempotent). Returns rows affected.
    pub async fn remove(&self, user: Uuid, item: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND item_id = $2")
            .bind(user)
            .bind(item)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Bookmarked items, most recently bookmarked first.
    pub async fn list_items(&self, user: Uuid, window: Window) -> Result<Paginated<Item>, DbError> {
        let rows: Vec<BookmarkedItem> = sqlx::query_as(
            r#"
            SELECT i.*, COUNT(*) OVER() AS total
            FROM bookmarks b
            JOIN items i ON i.id = b.item_id
            WHERE b.user_id = $1
            ORDER BY b.created_at DESC, i.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        let total = rows.first().map(|r| r.total).unwrap_or(0);
        Ok(Paginated {
            items: rows.into_iter().map(|r| r.item).collect(),
            total,
            skip: window.skip,
            limit: window.limit,
        })
    }
}
