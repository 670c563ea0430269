//! Bundle request endpoints
//!
//! Update and delete only touch the actor's own requests. Deleting someone
//! else's request is a silent no-op; updating one is a 404.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{BundleRequest, BundleRequestRepo, DbError, NewBundleRequest};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{Coordinates, Description, Location, Paginated, Phone, Window, WindowParams};

/// Create/update body
#[derive(Debug, Deserialize)]
pub struct BundleRequestBody {
    pub category_id: i64,
    pub description: String,
    pub phone: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl TryFrom<BundleRequestBody> for NewBundleRequest {
    type Error = ApiError;

    fn try_from(body: BundleRequestBody) -> Result<Self, Self::Error> {
        Ok(Self {
            category_id: body.category_id,
            description: Description::new(&body.description)?,
            phone: Phone::new(&body.phone)?,
            location: Location::new(&body.location)?,
            coordinates: Coordinates::from_parts(body.latitude, body.longitude)?,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct BundleRequestResponse {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub category_id: i64,
    pub description: String,
    pub phone: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub created_at: String,
}

impl From<BundleRequest> for BundleRequestResponse {
    fn from(r: BundleRequest) -> Self {
        Self {
            id: r.id,
            requester_id: r.requester_id,
            category_id: r.category_id,
            description: r.description,
            phone: r.phone,
            location: r.location,
            latitude: r.latitude,
            longitude: r.longitude,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

/// POST /bundle-requests
async fn create_request(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(body): Json<BundleRequestBody>,
) -> Result<(StatusCode, Json<BundleRequestResponse>), ApiError> {
    let req = NewBundleRequest::try_from(body)?;
    let created = BundleRequestRepo::new(&state.pool).create(actor.id, req).await?;
    tracing::info!(request = %created.id, requester = %actor.id, "bundle request created");
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /bundle-requests/{id}
async fn get_request(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<BundleRequestResponse>, ApiError> {
    let req = BundleRequestRepo::new(&state.pool).get(id).await?;
    Ok(Json(req.into()))
}

/// PUT /bundle-requests/{id}
async fn update_request(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ValidUuid(id): ValidUuid,
    Json(body): Json<BundleRequestBody>,
) -> Result<Json<BundleRequestResponse>, ApiError> {
    let req = NewBundleRequest::try_from(body)?;
    let updated = BundleRequestRepo::new(&state.pool)
        .update_owned(id, actor.id, req)
        .await?
        .ok_or_else(|| DbError::not_found("bundle request", id))?;
    Ok(Json(updated.into()))
}

/// DELETE /bundle-requests/{id} - 204 whether or not anything matched
async fn delete_request(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let deleted = BundleRequestRepo::new(&state.pool)
        .delete_owned(id, actor.id)
        .await?;
    tracing::debug!(request = %id, user = %actor.id, deleted, "bundle request delete");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me/bundle-requests
async fn my_requests(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(params): Query<WindowParams>,
) -> Result<Json<Paginated<BundleRequestResponse>>, ApiError> {
    let page = BundleRequestRepo::new(&state.pool)
        .list_by_requester(actor.id, Window::from(params))
        .await?;
    Ok(Json(page.map(BundleRequestResponse::from)))
}

/// Bundle request routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bundle-requests", post(create_request))
        .route(
            "/bundle-requests/{id}",
            get(get_request).put(update_request).delete(delete_request),
        )
        .route("/me/bundle-requests", get(my_requests))
}
