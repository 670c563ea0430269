//! Item endpoints: donate, browse, fetch, delete

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::repos::{CategoryRepo, Item, ItemRepo, NewItem};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;
use crate::models::{
    Coordinates, Cost, Description, Location, Paginated, Phone, Window, WindowParams,
};
use crate::storage::{is_user_key, BlobStore};

/// Donate request
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub category_id: i64,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: String,
    pub image_url: Option<String>,
    #[serde(default)]
    pub cost: i64,
}

impl CreateItemRequest {
    /// Field checks that need no database access.
    fn validate(self) -> Result<NewItem, ApiError> {
        Ok(NewItem {
            category_id: self.category_id,
            description: Description::new(&self.description)?,
            location: Location::new(&self.location)?,
            coordinates: Coordinates::from_parts(self.latitude, self.longitude)?,
            phone: Phone::new(&self.phone)?,
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            cost: Cost::new(self.cost)?,
        })
    }
}

/// `GET /items` query: window plus optional category filter
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsParams {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub category_id: Option<i64>,
}

/// Item as returned to clients
#[derive(Debug, Serialize)]
pub struct ItemResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category_id: i64,
    pub description: String,
    pub location: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub phone: String,
    pub image_url: Option<String>,
    pub cost: i64,
    pub is_sold: bool,
    pub reserved_by: Option<Uuid>,
    pub created_at: String,
}

impl From<Item> for ItemResponse {
    fn from(item: Item) -> Self {
        Self {
            id: item.id,
            owner_id: item.owner_id,
            category_id: item.category_id,
            description: item.description,
            location: item.location,
            latitude: item.latitude,
            longitude: item.longitude,
            phone: item.phone,
            image_url: item.image_url,
            cost: item.cost,
            is_sold: item.is_sold,
            reserved_by: item.reserved_by,
            created_at: item.created_at.to_rfc3339(),
        }
    }
}

/// POST /items - donate an item
async fn create_item(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Json(req): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), ApiError> {
    let mut item = req.validate()?;

    let category = CategoryRepo::new(&state.pool).get(item.category_id).await?;
    item.cost = item.cost.within_ceiling(category.max_price)?;

    let item = ItemRepo::new(&state.pool).create(actor.id, item).await?;
    tracing::info!(item = %item.id, owner = %actor.id, category = %category.name, "item donated");

    Ok((StatusCode::CREATED, Json(ItemResponse::from(item))))
}

/// GET /items - unsold items, newest first
async fn list_items(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListItemsParams>,
) -> Result<Json<Paginated<ItemResponse>>, ApiError> {
    let window = Window::from(WindowParams {
        skip: params.skip,
        limit: params.limit,
    });
    let page = ItemRepo::new(&state.pool)
        .list_available(window, params.category_id)
        .await?;

    Ok(Json(page.map(ItemResponse::from)))
}

/// GET /items/{id}
async fn get_item(
    State(state): State<Arc<AppState>>,
    ValidUuid(id): ValidUuid,
) -> Result<Json<ItemResponse>, ApiError> {
    let item = ItemRepo::new(&state.pool).get(id).await?;
    Ok(Json(ItemResponse::from(item)))
}

/// DELETE /items/{id} - owner delete; a non-owner delete is a silent no-op
async fn delete_item(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    let Some(item) = ItemRepo::new(&state.pool).delete_owned(id, actor.id).await? else {
        tracing::debug!(item = %id, user = %actor.id, "delete matched no owned item");
        return Ok(StatusCode::NO_CONTENT);
    };
    tracing::info!(item = %id, owner = %actor.id, "item deleted");

    let key = item
        .image_url
        .as_deref()
        .and_then(|url| owned_image_key(state.blobs.as_ref(), url, actor.id));
    if let Some(key) = key {
        // The row is already gone; a leftover blob is only logged
        if let Err(e) = state.blobs.delete(&key).await {
            tracing::warn!(item = %id, key = %key, error = %e, "failed to remove item image");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Blob key behind an item's image, if the owner uploaded it to this store.
fn owned_image_key(blobs: &dyn BlobStore, url: &str, owner: Uuid) -> Option<String> {
    blobs.key_for_url(url).filter(|key| is_user_key(key, owner))
}

/// GET /me/items - the actor's own listings
async fn my_items(
    State(state): State<Arc<AppState>>,
    AuthUser(actor): AuthUser,
    Query(params): Query<WindowParams>,
) -> Result<Json<Paginated<ItemResponse>>, ApiError> {
    let page = ItemRepo::new(&state.pool)
        .list_by_owner(actor.id, Window::from(params))
        .await?;
    Ok(Json(page.map(ItemResponse::from)))
}

/// Item routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).delete(delete_item))
        .route("/me/items", get(my_items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::LocalBlobStore;

    fn request() -> CreateItemRequest {
        CreateItemRequest {
            category_id: 2,
            description: "  Winter coat, size M  ".into(),
            location: "Tel Aviv".into(),
            latitude: Some(32.08),
            longitude: Some(34.78),
            phone: "+972 50-123-4567".into(),
            image_url: Some("".into()),
            cost: 0,
        }
    }

    #[test]
    fn image_key_must_belong_to_owner() {
        let store = LocalBlobStore::new("/tmp/onehand-blobs", "http://127.0.0.1:3030/public");
        let owner = Uuid::new_v4();
        let own = format!("http://127.0.0.1:3030/public/{}/a.png", owner);
        let foreign = format!("http://127.0.0.1:3030/public/{}/a.png", Uuid::new_v4());

        assert_eq!(
            owned_image_key(&store, &own, owner),
            Some(format!("{}/a.png", owner))
        );
        assert_eq!(owned_image_key(&store, &foreign, owner), None);
        assert_eq!(owned_image_key(&store, "https://cdn.example.com/a.png", owner), None);
    }

    #[test]
    fn validate_normalizes_fields() {
        let item = request().validate().unwrap();
        assert_eq!(item.description.as_str(), "Winter coat, size M");
        assert_eq!(item.phone.as_str(), "+972501234567");
        assert!(item.image_url.is_none());
        assert!(item.coordinates.is_some());
    }

    #[test]
    fn validate_rejects_negative_cost() {
        let req = CreateItemRequest {
            cost: -1,
            ..request()
        };
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn validate_rejects_half_coordinates() {
        let req = CreateItemRequest {
            longitude: None,
            ..request()
        };
        assert!(matches!(req.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn list_params_default_to_first_window() {
        let params = ListItemsParams::default();
        let window = Window::from(WindowParams {
            skip: params.skip,
            limit: params.limit,
        });
        assert_eq!(window, Window::new(0, 8));
    }
}

#[cfg(test)]
mod db_tests {
    use sqlx::PgPool;

    use super::*;
    use crate::db::{create_pool, migrations};

    async fn pool() -> PgPool {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
        let pool = create_pool(&url).await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn price_ceiling_is_enforced_per_category() {
        let pool = pool().await;
        let books = CategoryRepo::new(&pool)
            .list()
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.name == "Books")
            .unwrap();
        let ceiling = books.max_price.unwrap();

        let err = Cost::new(ceiling + 1)
            .unwrap()
            .within_ceiling(books.max_price)
            .unwrap_err();
        assert!(err.to_string().starts_with("price ceiling exceeded"));
    }
}
