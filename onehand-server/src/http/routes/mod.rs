//! Route handlers organized by resource

pub mod auth;
pub mod bookmarks;
pub mod bundle_requests;
pub mod categories;
pub mod health;
pub mod items;
pub mod reservations;
pub mod uploads;
