//! Item repository
//!
//! - Listing: unsold items, newest first, with `COUNT(*) OVER()` totals
//! - Reservation writes: single UPDATE statements, no version check
//! - Owner delete: filtered on owner_id, a miss is not an error

use chrono::{DateTime, Utc};
use onehand_core::reservation::IntegrityViolation;
use onehand_core::{Coordinates, Cost, Description, Location, Phone, ReservationState};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{missing_on_foreign_key, DbError};
use crate::models::{Paginated, Window};

/// Item record from database
#[derive(Debug, Clone, FromRow)]
pub struct Item {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: i64,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: String,
    pub image_url: Option<String>,
    pub cost: i64,
    pub is_sold: bool,
    pub reserved_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    /// Reservation state, or the way the stored columns disagree.
    pub fn reservation(&self) -> Result<ReservationState, IntegrityViolation> {
        ReservationState::from_columns(self.is_sold, self.reserved_by)
    }
}

#[derive(FromRow)]
struct ItemWithTotal {
    #[sqlx(flatten)]
    item: Item,
    total: i64,
}

fn into_page(rows: Vec<ItemWithTotal>, window: Window) -> Paginated<Item> {
    let total = rows.first().map(|r| r.total).unwrap_or(0);
    Paginated {
        items: rows.into_iter().map(|r| r.item).collect(),
        total,
        skip: window.skip,
        limit: window.limit,
    }
}

/// Validated donation
#[derive(Debug, Clone)]
pub struct NewItem {
    pub category_id: i64,
    pub description: Description,
    pub location: Location,
    pub coordinates: Option<Coordinates>,
    pub phone: Phone,
    pub image_url: Option<String>,
    pub cost: Cost,
}

/// Result of a reserve write, joined with what the owner notification needs
#[derive(Debug, Clone, FromRow)]
pub struct ReservedItem {
    pub id: Uuid,
    pub description: String,
    pub owner_email: String,
}

pub struct ItemRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ItemRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a donated item owned by `owner`.
    pub async fn create(&self, owner: Uuid, item: NewItem) -> Result<Item, DbError> {
        let (latitude, longitude) = item
            .coordinates
            .map(|c| (Some(c.latitude), Some(c.longitude)))
            .unwrap_or((None, None));

        sqlx::query_as(
            r#"
            INSERT INTO items
                (owner_id, category_id, description, location, latitude, longitude, phone, image_url, cost)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(owner)
        .bind(item.category_id)
        .bind(item.description.as_str())
        .bind(item.location.as_str())
        .bind(latitude)
        .bind(longitude)
        .bind(item.phone.as_str())
        .bind(item.image_url.as_deref())
        .bind(item.cost.value())
        .fetch_one(self.pool)
        .await
        .map_err(|e| missing_on_foreign_key(e, "category", item.category_id))
    }

    pub async fn get(&self, id: Uuid) -> Result<Item, DbError> {
        sqlx::query_as("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("item", id))
    }

    /// Unsold items, newest first, optionally restricted to one category.
    pub async fn list_available(
        &self,
        window: Window,
        category_id: Option<i64>,
    ) -> Result<Paginated<Item>, DbError> {
        let rows: Vec<ItemWithTotal> = sqlx::query_as(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM items
            WHERE is_sold = FALSE
              AND ($3::BIGINT IS NULL OR category_id = $3)
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(window.limit())
        .bind(window.offset())
        .bind(category_id)
        .fetch_all(self.pool)
        .await?;

        Ok(into_page(rows, window))
    }

    /// Items donated by `owner`, sold or not, newest first.
    pub async fn list_by_owner(
        &self,
        owner: Uuid,
        window: Window,
    ) -> Result<Paginated<Item>, DbError> {
        let rows: Vec<ItemWithTotal> = sqlx::query_as(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM items
            WHERE owner_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(owner)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(into_page(rows, window))
    }

    /// Items currently reserved by `user` (the cart), newest first.
    pub async fn list_reserved_by(
        &self,
        user: Uuid,
        window: Window,
    ) -> Result<Paginated<Item>, DbError> {
        let rows: Vec<ItemWithTotal> = sqlx::query_as(
            r#"
            SELECT *, COUNT(*) OVER() AS total
            FROM items
            WHERE reserved_by = $1 AND is_sold = TRUE
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user)
        .bind(window.limit())
        .bind(window.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(into_page(rows, window))
    }

    /// Delete an item if `owner` owns it, returning the removed row.
    pub async fn delete_owned(&self, id: Uuid, owner: Uuid) -> Result<Option<Item>, DbError> {
        let deleted = sqlx::query_as("DELETE FROM items WHERE id = $1 AND owner_id = $2 RETURNING *")
            .bind(id)
            .bind(owner)
            .fetch_optional(self.pool)
            .await?;
        Ok(deleted)
    }

    /// Mark an item reserved by `actor`, overwriting any current holder.
    ///
    /// Returns `None` when the item does not exist.
    pub async fn mark_reserved(
        &self,
        id: Uuid,
        actor: Uuid,
    ) -> Result<Option<ReservedItem>, DbError> {
        let (is_sold, reserved_by) = ReservationState::Reserved { by: actor }.to_columns();
        let reserved = sqlx::query_as(
            r#"
            WITH updated AS (
                UPDATE items
                SET is_sold = $2, reserved_by = $3
                WHERE id = $1
                RETURNING id, description, owner_id
            )
            SELECT u.id, u.description, o.email AS owner_email
            FROM updated u
            JOIN users o ON o.id = u.owner_id
            "#,
        )
        .bind(id)
        .bind(is_sold)
        .bind(reserved_by)
        .fetch_optional(self.pool)
        .await?;
        Ok(reserved)
    }

    /// Mark an item available again and clear its holder.
    ///
    /// With `holder = None` the update is unconditioned on who holds the
    /// reservation; with `Some(user)` it only matches rows reserved by
    /// that user. Returns rows affected.
    pub async fn mark_available(&self, id: Uuid, holder: Option<Uuid>) -> Result<u64, DbError> {
        let (is_sold, reserved_by) = ReservationState::Available.to_columns();
        let result = sqlx::query(
            r#"
            UPDATE items
            SET is_sold = $2, reserved_by = $3
            WHERE id = $1
              AND ($4::UUID IS NULL OR reserved_by = $4)
            "#,
        )
        .bind(id)
        .bind(is_sold)
        .bind(reserved_by)
        .bind(holder)
        .execute(self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Rows whose `is_sold` and `reserved_by` columns disagree.
    pub async fn integrity_violations(&self) -> Result<Vec<Item>, DbError> {
        let items = sqlx::query_as(
            r#"
            SELECT * FROM items
            WHERE (is_sold = FALSE AND reserved_by IS NOT NULL)
               OR (is_sold = TRUE AND reserved_by IS NULL)
            ORDER BY created_at
            "#,
        )
        .fetch_all(self.pool)
        .await?;
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(is_sold: bool, reserved_by: Option<Uuid>) -> Item {
        Item {
            id: Uuid::new_v4(),
            owner_id: Uuid::new_v4(),
            category_id: 1,
            description: "bookshelf".into(),
            location: "Haifa".into(),
            latitude: None,
            longitude: None,
            phone: "0501234567".into(),
            image_url: None,
            cost: 0,
            is_sold,
            reserved_by,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn reservation_reads_columns() {
        let holder = Uuid::new_v4();
        assert_eq!(
            item(false, None).reservation().unwrap(),
            ReservationState::Available
        );
        assert_eq!(
            item(true, Some(holder)).reservation().unwrap().reserved_by(),
            Some(holder)
        );
        assert!(item(false, Some(holder)).reservation().is_err());
    }

    #[test]
    fn empty_page_has_zero_total() {
        let page = into_page(Vec::new(), Window::default());
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
        assert_eq!(page.limit, 8);
    }

    // Integration tests - run with DATABASE_URL set
    // cargo test -p onehand-server -- --ignored

    async fn seeded_pool() -> (PgPool, Uuid, i64) {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool creation failed");
        crate::db::migrations::run(&pool).await.expect("migrations");

        let email = format!("items-{}@example.com", Uuid::new_v4());
        let (owner,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(email)
        .fetch_one(&pool)
        .await
        .expect("insert user");

        let (category,): (i64,) = sqlx::query_as("SELECT id FROM categories WHERE name = 'Other'")
            .fetch_one(&pool)
            .await
            .expect("category");

        (pool, owner, category)
    }

    fn donation(category_id: i64, n: usize) -> NewItem {
        NewItem {
            category_id,
            description: Description::new(&format!("donated thing {}", n)).unwrap(),
            location: Location::new("Jerusalem").unwrap(),
            coordinates: None,
            phone: Phone::new("0501234567").unwrap(),
            image_url: None,
            cost: Cost::new(0).unwrap(),
        }
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn listing_returns_at_most_eight_unsold_newest_first() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        for n in 0..10 {
            repo.create(owner, donation(category, n)).await.expect("create");
        }

        let page = repo
            .list_available(Window::new(0, 8), None)
            .await
            .expect("list");
        assert!(page.items.len() <= 8);
        assert!(page.items.iter().all(|i| !i.is_sold));
        assert!(page
            .items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unreserve_by_stranger_succeeds_without_owner_check() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let item = repo.create(owner, donation(category, 0)).await.expect("create");

        repo.mark_reserved(item.id, owner).await.expect("reserve");
        let stranger = Uuid::new_v4();
        assert_eq!(repo.mark_available(item.id, Some(stranger)).await.unwrap(), 0);
        assert_eq!(repo.mark_available(item.id, None).await.unwrap(), 1);

        let fresh = repo.get(item.id).await.expect("get");
        assert_eq!(fresh.reservation().unwrap(), ReservationState::Available);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn reserved_items_show_up_in_the_cart() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let item = repo.create(owner, donation(category, 1)).await.expect("create");

        let reserved = repo
            .mark_reserved(item.id, owner)
            .await
            .expect("reserve")
            .expect("item exists");
        assert_eq!(reserved.id, item.id);

        let cart = repo
            .list_reserved_by(owner, Window::default())
            .await
            .expect("cart");
        assert!(cart.items.iter().any(|i| i.id == item.id));
        assert!(cart.total >= 1);

        assert!(repo.mark_reserved(Uuid::new_v4(), owner).await.unwrap().is_none());
    }

    async fn insert_user(pool: &PgPool) -> Uuid {
        let (id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO users (email, password_hash) VALUES ($1, 'x') RETURNING id",
        )
        .bind(format!("items-{}@example.com", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .expect("insert user");
        id
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn integrity_violations_finds_disagreeing_columns() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let holder = insert_user(&pool).await;

        let dangling = repo.create(owner, donation(category, 0)).await.expect("create");
        let orphaned = repo.create(owner, donation(category, 1)).await.expect("create");
        let consistent = repo.create(owner, donation(category, 2)).await.expect("create");

        // Written around the repo, the way a foreign client could
        for (id, is_sold, reserved_by) in [
            (dangling.id, false, Some(holder)),
            (orphaned.id, true, None),
        ] {
            sqlx::query("UPDATE items SET is_sold = $2, reserved_by = $3 WHERE id = $1")
                .bind(id)
                .bind(is_sold)
                .bind(reserved_by)
                .execute(&pool)
                .await
                .expect("raw update");
        }
        repo.mark_reserved(consistent.id, holder).await.expect("reserve");

        let found: Vec<Item> = repo
            .integrity_violations()
            .await
            .expect("audit")
            .into_iter()
            .filter(|i| i.owner_id == owner)
            .collect();
        assert_eq!(found.len(), 2);

        let violation = |id: Uuid| {
            found
                .iter()
                .find(|i| i.id == id)
                .map(|i| i.reservation().unwrap_err())
        };
        assert_eq!(
            violation(dangling.id),
            Some(IntegrityViolation::AvailableWithReserver(holder))
        );
        assert_eq!(
            violation(orphaned.id),
            Some(IntegrityViolation::ReservedWithoutReserver)
        );
        assert!(violation(consistent.id).is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn deleting_the_reserver_releases_the_item() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let taker = insert_user(&pool).await;
        let item = repo.create(owner, donation(category, 0)).await.expect("create");

        repo.mark_reserved(item.id, taker).await.expect("reserve");
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(taker)
            .execute(&pool)
            .await
            .expect("delete user");

        let fresh = repo.get(item.id).await.expect("get");
        assert_eq!(fresh.reservation(), Ok(ReservationState::Available));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn only_the_owner_can_delete() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let stranger = insert_user(&pool).await;
        let item = repo.create(owner, donation(category, 0)).await.expect("create");

        assert!(repo.delete_owned(item.id, stranger).await.unwrap().is_none());
        assert!(repo.get(item.id).await.is_ok());

        let deleted = repo.delete_owned(item.id, owner).await.unwrap();
        assert_eq!(deleted.map(|i| i.id), Some(item.id));
        assert!(matches!(repo.get(item.id).await, Err(DbError::NotFound { .. })));
        assert!(repo.delete_owned(item.id, owner).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn my_items_lists_only_the_owner_newest_first() {
        let (pool, owner, category) = seeded_pool().await;
        let repo = ItemRepo::new(&pool);
        let other = insert_user(&pool).await;

        let mut created = Vec::new();
        for n in 0..3 {
            created.push(repo.create(owner, donation(category, n)).await.expect("create").id);
        }
        repo.create(other, donation(category, 9)).await.expect("create");

        let page = repo
            .list_by_owner(owner, Window::default())
            .await
            .expect("list");
        assert_eq!(page.total, 3);
        assert!(page.items.iter().all(|i| i.owner_id == owner));
        assert!(page
            .items
            .windows(2)
            .all(|pair| pair[0].created_at >= pair[1].created_at));

        let mut listed: Vec<Uuid> = page.items.iter().map(|i| i.id).collect();
        listed.sort();
        created.sort();
        assert_eq!(listed, created);
    }
}
