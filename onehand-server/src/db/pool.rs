//! Postgres connection pool

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Connections held when no limit is configured
pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

fn options(max_connections: u32) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(ACQUIRE_TIMEOUT)
}

/// Connect with the default connection limit.
///
/// ```ignore
/// let pool = create_pool("postgres://localhost/onehand").await?;
/// ```
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    create_pool_with_options(database_url, DEFAULT_MAX_CONNECTIONS).await
}

/// Connect eagerly, failing fast if the database is unreachable.
pub async fn create_pool_with_options(
    database_url: &str,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    let pool = options(max_connections).connect(database_url).await?;
    tracing::debug!(max_connections, "database pool ready");
    Ok(pool)
}

/// Pool that opens connections on first use. Only the URL is checked here.
/// Must be called inside a Tokio runtime.
pub fn lazy_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    options(DEFAULT_MAX_CONNECTIONS).connect_lazy(database_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lazy_pool_does_not_connect() {
        // Nothing listens on port 1
        let pool = lazy_pool("postgres://onehand@127.0.0.1:1/onehand").unwrap();
        assert_eq!(pool.size(), 0);
    }

    #[tokio::test]
    async fn lazy_pool_rejects_malformed_url() {
        assert!(lazy_pool("definitely not a url").is_err());
    }

    // Run with: DATABASE_URL=postgres://... cargo test -p onehand-server -- --ignored
    #[tokio::test]
    #[ignore = "requires database"]
    async fn connects_and_answers_queries() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = create_pool_with_options(&url, 2).await.expect("connect");
        let (one,): (i32,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(one, 1);
    }
}
