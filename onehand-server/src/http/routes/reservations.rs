//! Reservation endpoints: reserve, unreserve, cart

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use uuid::Uuid;

use super::items::ItemResponse;
use crate::db::repos::ItemRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, MaybeUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Paginated, Window, WindowParams};
use crate::reservation::Reserved;

/// Tells the client which item to drop from its displayed collection
#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub removed: Uuid,
}

/// POST /items/{id}/reserve
async fn reserve(
    State(state): State<Arc<AppState>>,
    MaybeUser(actor): MaybeUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Reserved>, ApiError> {
    let reserved = state.reservations.reserve(id, actor.as_ref()).await?;
    Ok(Json(reserved))
}

/// POST /items/{id}/unreserve
async fn unreserve(
    State(state): State<Arc<AppState>>,
    MaybeUser(actor): MaybeUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<RemovedResponse>, ApiError> {
    let removed = state.reservations.unreserve(id, actor.as_ref()).await?;
    Ok(Json(RemovedResponse { removed }))
}

/// GET /me/reservations - items the actor has reserved
async fn my_reservations(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(params): Query<WindowParams>,
) -> Result<Json<Paginated<ItemResponse>>, ApiError> {
    let page = ItemRepo::new(&state.pool)
        .list_reserved_by(actor.id, Window::from(params))
        .await?;
    Ok(Json(page.map(ItemResponse::from)))
}

/// Reservation routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items/{id}/reserve", post(reserve))
        .route("/items/{id}/unreserve", post(unreserve))
        .route("/me/reservations", get(my_reservations))
}
