//! Database layer - connection pool, migrations and repositories
//!
//! - Connection pool, never Arc<Mutex<Connection>>
//! - Rely on DB constraints and map their violations, no check-then-insert
//! - Owner-scoped mutations filter on the owner column instead of
//!   reading the row first

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_pool, create_pool_with_options, lazy_pool};
pub use sqlx::PgPool;
pub use repos::*;
