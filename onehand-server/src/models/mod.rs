//! Request-facing models
//!
//! Input validation types come from onehand-core; this module adds the
//! list windowing used by every collection endpoint.

pub mod window;

pub use onehand_core::validation::*;
pub use window::{Paginated, Window, WindowParams, DEFAULT_LIMIT};
