//! onehand-server: HTTP API for the One Hand donation marketplace
//!
//! Items, reservations, bookmarks, bundle requests and categories over
//! PostgreSQL, with token auth, a local blob store for images and a
//! best-effort email notifier.

pub mod auth;
pub mod db;
pub mod http;
pub mod models;
pub mod notify;
pub mod reservation;
pub mod storage;

pub use http::{run_server, ApiError, AppState, ServerConfig};
