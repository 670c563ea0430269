//! Bundle request repository
//!
//! Updates and deletes are filtered on requester_id, so touching somebody
//! else's request matches zero rows instead of erroring.

use chrono::{DateTime, Utc};
use onehand_core::{Coordinates, Description, Location, Phone};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{missing_on_foreign_key, DbError};
use crate::models::{Paginated, Window};

/// Bundle request record from database
#[derive(Debug, Clone, FromRow)]
pub struct BundleRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub category_id: i64,
    pub description: String,
    pub phone: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(FromRow)]
struct BundleRequestWithTotal {
    #[sqlx(flatten)]
    request: BundleRequest,
    total: i64,
}

/// Validated bundle request fields, used for both create and update
#[derive(Debug, Clone)]
pub struct NewBundleRequest {
    pub category_id: i64,
    pub description: Description,
    pub phone: Phone,
    pub location: Location,
    pub coordinates: Option<Coordinates>,
}

impl NewBundleRequest {
    fn lat_lon(&self) -> (Option<f64>, Option<f64>) {
        self.coordinates
            .map(|c| (Some(c.latitude), Some(c.longitude)))
            .unwrap_or((None, None))
    }
}

pub struct BundleRequestRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BundleRequestRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        requester: Uuid,
        req: NewBundleRequest,
    ) -> Result<BundleRequest, DbError> {
        let (latitude, longitude) = req.lat_lon();
        sqlx::query_as(
            r#"
            INSERT INTO bundle_requests
                (requester_id, category_id, description, phone, location, latitude, longitude)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(requester)
        .bind(req.category_id)
        .bind(req.description.as_str())
        .bind(req.phone.as_str())
        .bind(req.location.as_str())
        .bind(latitude)
        .bind(longitude)
        .fetch_one(self.pool)
        .await
        .map_err(|e| missing_on_foreign_key(e, "category", req.category_id))
    }

    pub async fn get(&self, id: Uuid) -> Result<BundleRequest, DbError> {
        sqlx::query_as("SELECT * FROM bundle_requests WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("bundle request", id))
    }

    /// Requests made by `requester`, newest first.
    pub async fn list_by_requester(
        &self,
        requester: Uuid,
        window: Window,
    ) -> Result<Paginated<BundleRequest>, DbError> {
        let rows: Vec<BundleRequestWithTotal> = sqlx::query_as(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM bundle_requests
            WHERE requester_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(requester)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        let total = rows.first().map(|r| r.total).unwrap_or(0);
        Ok(Paginated {
            items: rows.into_iter().map(|r| r.request).collect(),
            total,
            skip: window.skip,
            limit: window.limit,
        })
    }

    /// Replace the fields of a request owned by `requester`.
    ///
    /// Returns `None` when no request with that id belongs to `requester`.
    pub async fn update_owned(
        &self,
        id: Uuid,
        requester: Uuid,
        req: NewBundleRequest,
    ) -> Result<Option<BundleRequest>, DbError> {
        let (latitude, longitude) = req.lat_lon();
        sqlx::query_as(
            r#"
            UPDATE bundle_requests
            SET category_id = $3,
                description = $4,
                phone = $5,
                location = $6,
                latitude = $7,
                longitude = $8
            WHERE id = $1 AND requester_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(requester)
        .bind(req.category_id)
        .bind(req.description.as_str())
        .bind(req.phone.as_str())
        .bind(req.location.as_str())
        .bind(latitude)
        .bind(longitude)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| missing_on_foreign_key(e, "category", req.category_id))
    }

    /// Delete a request if `requester` made it. Returns rows affected.
    pub async fn delete_owned(&self, id: Uuid, requester: Uuid) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM bundle_requests WHERE id = $1 AND requester_id = $2")
            .bind(id)
            .bind(requester)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
