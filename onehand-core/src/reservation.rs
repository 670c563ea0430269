//! Two-state reservation model for items
//!
//! An item is either available or reserved by exactly one user. In storage
//! this is the `is_sold` flag plus the nullable `reserved_by` column, and
//! the two must agree: `reserved_by` is set iff `is_sold` is true.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validation::ValidationError;

/// Who may release a reservation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationPolicy {
    /// Any authenticated user may unreserve any reserved item
    #[default]
    Open,
    /// Only the user holding the reservation may release it
    OwnerOnly,
}

impl ReservationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::OwnerOnly => "owner_only",
        }
    }

    /// Holder a release by `actor` must match. `None` releases regardless
    /// of who holds the item.
    pub fn required_holder(self, actor: Uuid) -> Option<Uuid> {
        match self {
            Self::Open => None,
            Self::OwnerOnly => Some(actor),
        }
    }
}

impl fmt::Display for ReservationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReservationPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "owner_only" | "owner-only" => Ok(Self::OwnerOnly),
            other => Err(ValidationError::InvalidVariant {
                field: "reservation policy",
                value: other.to_owned(),
            }),
        }
    }
}

/// Reservation state of a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReservationState {
    Available,
    Reserved { by: Uuid },
}

/// Stored columns disagree about whether an item is reserved
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IntegrityViolation {
    #[error("item is available but still names reserving user {0}")]
    AvailableWithReserver(Uuid),

    #[error("item is marked reserved but has no reserving user")]
    ReservedWithoutReserver,
}

impl ReservationState {
    /// Read the state from the `is_sold` / `reserved_by` column pair.
    pub fn from_columns(
        is_sold: bool,
        reserved_by: Option<Uuid>,
    ) -> Result<Self, IntegrityViolation> {
        match (is_sold, reserved_by) {
            (false, None) => Ok(Self::Available),
            (true, Some(by)) => Ok(Self::Reserved { by }),
            (false, Some(by)) => Err(IntegrityViolation::AvailableWithReserver(by)),
            (true, None) => Err(IntegrityViolation::ReservedWithoutReserver),
        }
    }

    /// The `(is_sold, reserved_by)` pair to write for this state.
    pub fn to_columns(self) -> (bool, Option<Uuid>) {
        match self {
            Self::Available => (false, None),
            Self::Reserved { by } => (true, Some(by)),
        }
    }

    pub fn reserved_by(&self) -> Option<Uuid> {
        match self {
            Self::Available => None,
            Self::Reserved { by } => Some(*by),
        }
    }

    /// State after `actor` reserves the item.
    ///
    /// Unconditional: an existing reservation is overwritten (last write wins).
    pub fn reserve(self, actor: Uuid) -> Self {
        Self::Reserved { by: actor }
    }
}
