//! Category endpoints (read-only; categories are seeded by migrations)

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::db::repos::{Category, CategoryRepo};
use crate::http::error::ApiError;
use crate::http::server::AppState;

/// GET /categories
async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(CategoryRepo::new(&state.pool).list().await?))
}

/// GET /categories/{id}
async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    Ok(Json(CategoryRepo::new(&state.pool).get(id).await?))
}

/// Category routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories/{id}", get(get_category))
}
