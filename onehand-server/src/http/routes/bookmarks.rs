//! Bookmark endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};

use super::items::ItemResponse;
use crate::db::repos::BookmarkRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, Window, WindowParams};

/// PUT /items/{id}/bookmark - idempotent
async fn add_bookmark(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ValidUuid(item): ValidUuid,
) -> Result<StatusCode, ApiError> {
    BookmarkRepo::new(&state.pool).add(actor.id, item).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /items/{id}/bookmark
async fn remove_bookmark(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ValidUuid(item): ValidUuid,
) -> Result<StatusCode, ApiError> {
    BookmarkRepo::new(&state.pool).remove(actor.id, item).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me/bookmarks
async fn my_bookmarks(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(params): Query<WindowParams>,
) -> Result<Json<Paginated<ItemResponse>>, ApiError> {
    let page = BookmarkRepo::new(&state.pool)
        .list_items(actor.id, Window::from(params))
        .await?;
    Ok(Json(page.map(ItemResponse::from)))
}

/// Bookmark routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items/{id}/bookmark", put(add_bookmark).delete(remove_bookmark))
        .route("/me/bookmarks", get(my_bookmarks))
}
