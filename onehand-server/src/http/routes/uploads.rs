//! Image upload endpoint
//!
//! The body is the raw image; `Content-Type` picks the extension. Size is
//! capped by the router's body limit, which answers 413 before this runs.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};

use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;
use crate::models::ValidationError;
use crate::storage::{user_object_key, StoredObject};

/// POST /uploads
async fn upload(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredObject>), ApiError> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if body.is_empty() {
        return Err(ValidationError::Empty { field: "image" }.into());
    }

    let key = user_object_key(actor.id, content_type)?;
    let stored = state.blobs.put(&key, &body).await?;

    Ok((StatusCode::CREATED, Json(stored)))
}

/// Upload routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/uploads", post(upload))
}
