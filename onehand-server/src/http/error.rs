//! API error type with IntoResponse
//!
//! Every error becomes `{"error": <code>, "message": <text>}` with a
//! matching status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::auth::AuthError;
use crate::db::repos::DbError;
use crate::models::ValidationError;
use crate::reservation::ReservationError;
use crate::storage::StorageError;

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Malformed request outside field validation (400)
    BadRequest { message: String },

    /// No usable session (401)
    Unauthorized { message: String },

    /// Authenticated but not allowed (403)
    Forbidden { reason: String },

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (409)
    Conflict { resource: &'static str },

    /// Upload content type not accepted (415)
    UnsupportedMediaType { content_type: String },

    /// Store error (500, message passed through)
    Store(DbError),

    /// Internal error (500, message hidden)
    Internal { message: String },
}

impl ApiError {
    pub fn must_be_logged_in() -> Self {
        Self::Unauthorized {
            message: ReservationError::NotLoggedIn.to_string(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::UnsupportedMediaType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::Store(_) | Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (code, message) = match self {
            Self::Validation(e) => ("validation_error", e.to_string()),
            Self::BadRequest { message } => ("bad_request", message),
            Self::Unauthorized { message } => ("unauthorized", message),
            Self::Forbidden { reason } => ("forbidden", reason),
            Self::NotFound { resource, id } => {
                ("not_found", format!("{} '{}' not found", resource, id))
            }
            Self::Conflict { resource } => ("conflict", format!("{} already exists", resource)),
            Self::UnsupportedMediaType { content_type } => (
                "unsupported_media_type",
                format!("unsupported content type: {}", content_type),
            ),
            Self::Store(e) => {
                tracing::error!("Store error: {}", e);
                ("store_error", e.to_string())
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                ("internal_error", "an internal error occurred".to_string())
            }
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Conflict { resource } => Self::Conflict { resource },
            DbError::Sqlx(_) => Self::Store(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidToken | AuthError::InvalidCredentials => Self::Unauthorized {
                message: e.to_string(),
            },
            AuthError::Hashing(_) | AuthError::Token(_) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::UnsupportedContentType(content_type) => {
                Self::UnsupportedMediaType { content_type }
            }
            StorageError::InvalidKey(_) => Self::BadRequest {
                message: e.to_string(),
            },
            StorageError::Io(_) => Self::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl From<ReservationError> for ApiError {
    fn from(e: ReservationError) -> Self {
        match e {
            ReservationError::NotLoggedIn => Self::must_be_logged_in(),
            ReservationError::NotFound(id) => Self::NotFound {
                resource: "item",
                id: id.to_string(),
            },
            ReservationError::NotHolder(_) => Self::Forbidden {
                reason: e.to_string(),
            },
            ReservationError::Store(db) => db.into(),
        }
    }
}
