//! Idempotent schema migrations

use sqlx::PgPool;

/// Categories created on first run: (name, fixed price ceiling)
const SEED_CATEGORIES: &[(&str, Option<i64>)] = &[
    ("Furniture", None),
    ("Clothing", Some(50)),
    ("Electronics", None),
    ("Books", Some(20)),
    ("Toys", Some(30)),
    ("Kitchen", None),
    ("Baby", Some(40)),
    ("Other", None),
];

/// Advisory lock held while migrating
const MIGRATION_LOCK_KEY: i64 = 0x6f6e_6568_616e_64;

/// Run all migrations in one transaction. Safe to call on every start.
pub async fn run(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running migrations...");

    // Concurrent starts (and parallel tests) queue here instead of racing DDL
    let mut tx = pool.begin().await?;
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(MIGRATION_LOCK_KEY)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            phone TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            max_price BIGINT CHECK (max_price IS NULL OR max_price >= 0)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    // is_sold/reserved_by agreement is kept by the writers and the
    // release trigger below, not by a CHECK, so that `onehand audit` can
    // still find rows written by other clients.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            category_id BIGINT NOT NULL REFERENCES categories(id),
            description TEXT NOT NULL,
            location TEXT NOT NULL,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            phone TEXT NOT NULL,
            image_url TEXT,
            cost BIGINT NOT NULL DEFAULT 0 CHECK (cost >= 0),
            is_sold BOOLEAN NOT NULL DEFAULT FALSE,
            reserved_by UUID REFERENCES users(id),
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_items_available ON items (created_at DESC) WHERE is_sold = FALSE",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_owner ON items (owner_id, created_at DESC)")
        .execute(&mut *tx)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_items_reserved_by ON items (reserved_by)")
        .execute(&mut *tx)
        .await?;

    // Deleting a user releases everything they reserved, both columns at once
    sqlx::query(
        r#"
        CREATE OR REPLACE FUNCTION release_reservations_of_deleted_user() RETURNS TRIGGER AS $$
        BEGIN
            UPDATE items SET is_sold = FALSE, reserved_by = NULL WHERE reserved_by = OLD.id;
            RETURN OLD;
        END;
        $$ LANGUAGE plpgsql
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query("DROP TRIGGER IF EXISTS users_release_reservations ON users")
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        r#"
        CREATE TRIGGER users_release_reservations
            BEFORE DELETE ON users
            FOR EACH ROW EXECUTE FUNCTION release_reservations_of_deleted_user()
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bundle_requests (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            requester_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            category_id BIGINT NOT NULL REFERENCES categories(id),
            description TEXT NOT NULL,
            phone TEXT NOT NULL,
            location TEXT NOT NULL,
            latitude DOUBLE PRECISION,
            longitude DOUBLE PRECISION,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_bundle_requests_requester ON bundle_requests (requester_id, created_at DESC)",
    )
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookmarks (
            user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            item_id UUID NOT NULL REFERENCES items(id) ON DELETE CASCADE,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            PRIMARY KEY (user_id, item_id)
        )
        "#,
    )
    .execute(&mut *tx)
    .await?;

    for (name, max_price) in SEED_CATEGORIES {
        sqlx::query("INSERT INTO categories (name, max_price) VALUES ($1, $2) ON CONFLICT (name) DO NOTHING")
            .bind(*name)
            .bind(*max_price)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    tracing::info!("Migrations complete");
    Ok(())
}
