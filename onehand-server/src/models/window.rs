//! Offset/limit windows for list endpoints

use serde::{Deserialize, Serialize};

/// Maximum items per window
const MAX_LIMIT: u32 = 100;

/// Default items per window (one row of cards in the client)
pub const DEFAULT_LIMIT: u32 = 8;

/// Validated skip/limit pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub skip: u32,
    pub limit: u32,
}

impl Window {
    /// Create a window, clamping limit to 1..=100.
    pub fn new(skip: u32, limit: u32) -> Self {
        Self {
            skip,
            limit: limit.clamp(1, MAX_LIMIT),
        }
    }

    /// SQL OFFSET value.
    pub fn offset(&self) -> i64 {
        i64::from(self.skip)
    }

    /// SQL LIMIT value.
    pub fn limit(&self) -> i64 {
        i64::from(self.limit)
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(0, DEFAULT_LIMIT)
    }
}

/// Query parameters for windowed lists (`?skip=0&limit=8`)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl From<WindowParams> for Window {
    fn from(params: WindowParams) -> Self {
        Self::new(
            params.skip.unwrap_or(0),
            params.limit.unwrap_or(DEFAULT_LIMIT),
        )
    }
}

/// One window of a list plus the total row count
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    /// Total count across all windows
    pub total: i64,
    pub skip: u32,
    pub limit: u32,
}

impl<T> Paginated<T> {
    /// Convert the items, keeping the window metadata.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            skip: self.skip,
            limit: self.limit,
        }
    }
}
