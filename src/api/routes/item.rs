//! Item routes - CRUD over `/items`. Every route requires a bearer token; the
//! guard is applied by [`crate::api::router`].

use crate::{
    api::{
        AppState,
        extract::{Json, Path},
    },
    core::item::{self, ItemPatch, NewItem},
    entities::ItemModel,
    errors::Result,
};
use axum::{Router, extract::State, routing::get};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};

/// `/items` routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route(
            "/items/{item_id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
}

/// HTTP: return every item.
pub async fn list_items(State(db): State<DatabaseConnection>) -> Result<Json<Vec<ItemModel>>> {
    Ok(Json(item::list_items(&db).await?))
}

/// HTTP: return one item.
pub async fn get_item(
    State(db): State<DatabaseConnection>,
    Path(item_id): Path<i32>,
) -> Result<Json<ItemModel>> {
    Ok(Json(item::get_item(&db, item_id).await?))
}

/// HTTP: create an item.
pub async fn create_item(
    State(db): State<DatabaseConnection>,
    Json(new_item): Json<NewItem>,
) -> Result<Json<ItemModel>> {
    Ok(Json(item::create_item(&db, new_item).await?))
}

/// HTTP: partially update an item.
pub async fn update_item(
    State(db): State<DatabaseConnection>,
    Path(item_id): Path<i32>,
    Json(patch): Json<ItemPatch>,
) -> Result<Json<ItemModel>> {
    Ok(Json(item::update_item(&db, item_id, patch).await?))
}

/// HTTP: delete an item.
pub async fn delete_item(
    State(db): State<DatabaseConnection>,
    Path(item_id): Path<i32>,
) -> Result<Json<Value>> {
    item::delete_item(&db, item_id).await?;
    Ok(Json(json!({ "message": "Item removed successfully" })))
}
