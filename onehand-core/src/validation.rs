//! Validated input types
//!
//! All user input is validated when these types are constructed.
//! Invalid input returns ValidationError, not panic.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// Maximum length for item and bundle request descriptions
const MAX_DESCRIPTION_LEN: usize = 2000;

/// Maximum length for free-form locations
const MAX_LOCATION_LEN: usize = 256;

/// Maximum length for email addresses (RFC 5321 path limit)
const MAX_EMAIL_LEN: usize = 254;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Digits with an optional leading `+`, after separators are stripped.
static PHONE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+?[0-9]{7,20}$").expect("invalid phone regex"));

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("invalid email regex"));

/// Validation error for user input
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Field is empty when it shouldn't be
    Empty { field: &'static str },

    /// Field exceeds maximum length
    TooLong { field: &'static str, max: usize },

    /// Field is shorter than the minimum length
    TooShort { field: &'static str, min: usize },

    /// String doesn't match required format
    InvalidFormat { field: &'static str, reason: &'static str },

    /// Numeric value outside its allowed range
    OutOfRange { field: &'static str, reason: &'static str },

    /// Item cost is above the category's fixed price ceiling
    PriceCeilingExceeded { cost: i64, ceiling: i64 },

    /// Invalid enum variant
    InvalidVariant { field: &'static str, value: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{} cannot be empty", field),
            Self::TooLong { field, max } => {
                write!(f, "{} exceeds maximum length of {} characters", field, max)
            }
            Self::TooShort { field, min } => {
                write!(f, "{} must be at least {} characters", field, min)
            }
            Self::InvalidFormat { field, reason } => write!(f, "{}: {}", field, reason),
            Self::OutOfRange { field, reason } => write!(f, "{}: {}", field, reason),
            Self::PriceCeilingExceeded { cost, ceiling } => write!(
                f,
                "price ceiling exceeded: cost {} is above the category maximum of {}",
                cost, ceiling
            ),
            Self::InvalidVariant { field, value } => {
                write!(f, "invalid {} value: '{}'", field, value)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

fn bounded_text(
    s: &str,
    field: &'static str,
    max: usize,
) -> Result<String, ValidationError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(trimmed.to_owned())
}

/// Free-text description of an item or bundle request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Description(String);

impl Description {
    /// Trimmed, non-empty, at most 2000 characters.
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text(s, "description", MAX_DESCRIPTION_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Human-readable pickup location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location(String);

impl Location {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        bounded_text(s, "location", MAX_LOCATION_LEN).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Contact phone number, stored without separators
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phone(String);

impl Phone {
    /// Accepts digits with an optional leading `+`.
    ///
    /// Spaces, dashes, dots and parentheses are stripped before checking.
    ///
    /// # Example
    /// ```
    /// use onehand_core::Phone;
    ///
    /// assert_eq!(Phone::new("+972 50-123-4567").unwrap().as_str(), "+972501234567");
    /// assert!(Phone::new("call me").is_err());
    /// ```
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
            .collect();

        if normalized.is_empty() {
            return Err(ValidationError::Empty { field: "phone" });
        }

        if !PHONE_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "phone",
                reason: "must be 7 to 20 digits with an optional leading '+'",
            });
        }

        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, ValidationError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(ValidationError::OutOfRange {
                field: "latitude",
                reason: "must be between -90 and 90",
            });
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(ValidationError::OutOfRange {
                field: "longitude",
                reason: "must be between -180 and 180",
            });
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build coordinates from an optional pair; both or neither must be given.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, ValidationError> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(ValidationError::InvalidFormat {
                field: "coordinates",
                reason: "latitude and longitude must be given together",
            }),
        }
    }
}

/// Item cost in minor currency units
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Cost(i64);

impl Cost {
    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: "cost",
                reason: "cannot be negative",
            });
        }
        Ok(Self(value))
    }

    /// Reject the cost if the category has a fixed ceiling below it.
    ///
    /// # Example
    /// ```
    /// use onehand_core::Cost;
    ///
    /// let cost = Cost::new(150).unwrap();
    /// assert!(cost.within_ceiling(None).is_ok());
    /// assert!(cost.within_ceiling(Some(150)).is_ok());
    /// assert!(cost.within_ceiling(Some(100)).is_err());
    /// ```
    pub fn within_ceiling(self, ceiling: Option<i64>) -> Result<Self, ValidationError> {
        match ceiling {
            Some(max) if self.0 > max => Err(ValidationError::PriceCeilingExceeded {
                cost: self.0,
                ceiling: max,
            }),
            _ => Ok(self),
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Normalized (trimmed, lowercase) email address
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Email(String);

impl Email {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let normalized = s.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if normalized.len() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if !EMAIL_RE.is_match(&normalized) {
            return Err(ValidationError::InvalidFormat {
                field: "email",
                reason: "must look like name@example.com",
            });
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Plaintext password that passed length checks; never serialized.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(s: &str) -> Result<Self, ValidationError> {
        let len = s.chars().count();
        if len < MIN_PASSWORD_LEN {
            return Err(ValidationError::TooShort {
                field: "password",
                min: MIN_PASSWORD_LEN,
            });
        }
        if len > MAX_PASSWORD_LEN {
            return Err(ValidationError::TooLong {
                field: "password",
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(Self(s.to_owned()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}
