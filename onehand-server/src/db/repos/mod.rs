//! Repository implementations for database access
//!
//! Each repository borrows the pool and exposes one method per query.
//! Owner-scoped updates and deletes report rows affected instead of
//! failing when nothing matched.

pub mod bookmarks;
pub mod bundle_requests;
pub mod categories;
pub mod items;
pub mod users;

pub use bookmarks::BookmarkRepo;
pub use bundle_requests::{BundleRequest, BundleRequestRepo, NewBundleRequest};
pub use categories::{Category, CategoryRepo};
pub use items::{Item, ItemRepo, NewItem, ReservedItem};
pub use users::{User, UserCredentials, UserRepo};

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("{resource} already exists")]
    Conflict { resource: &'static str },
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

/// Map a unique-constraint violation to `Conflict`, leaving other errors as-is.
pub(crate) fn conflict_on_unique(err: sqlx::Error, resource: &'static str) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => DbError::Conflict { resource },
        _ => DbError::Sqlx(err),
    }
}

/// Map a foreign-key violation to `NotFound` for the referenced resource.
pub(crate) fn missing_on_foreign_key(
    err: sqlx::Error,
    resource: &'static str,
    id: impl ToString,
) -> DbError {
    match &err {
        sqlx::Error::Database(db) if db.is_foreign_key_violation() => DbError::not_found(resource, id),
        _ => DbError::Sqlx(err),
    }
}
