//! Catalog handlers: item groups and items.

use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::AppError;
use crate::models::{Item, ItemGroup, ItemGroupPayload, ItemPayload, ItemWithGroup};
use crate::startup::AppState;

/// GET /api/item-groups
pub async fn list_item_groups(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemGroup>>, AppError> {
    Ok(Json(state.db.list_item_groups().await?))
}

/// POST /api/item-groups
pub async fn create_item_group(
    State(state): State<AppState>,
    Json(payload): Json<ItemGroupPayload>,
) -> Result<(StatusCode, Json<ItemGroup>), AppError> {
    payload.validate()?;
    let group = state.db.create_item_group(&payload).await?;
    Ok((StatusCode::CREATED, Json(group)))
}

/// PUT /api/item-groups/:id
pub async fn update_item_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemGroupPayload>,
) -> Result<Json<ItemGroup>, AppError> {
    payload.validate()?;
    Ok(Json(state.db.update_item_group(id, &payload).await?))
}

/// Delete an item group. Returns 409 while it still contains items.
///
/// DELETE /api/item-groups/:id
pub async fn delete_item_group(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.db.delete_item_group(id).await?;
    Ok(Json(json!({ "message": "Item group deleted" })))
}

/// GET /api/items
pub async fn list_items(
    State(state): State<AppState>,
) -> Result<Json<Vec<ItemWithGroup>>, AppError> {
    Ok(Json(state.db.list_items().await?))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    Json(payload): Json<ItemPayload>,
) -> Result<(StatusCode, Json<Item>), AppError> {
    payload.validate()?;
    let item = state.db.create_item(&payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// PUT /api/items/:id
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ItemPayload>,
) -> Result<Json<Item>, AppError> {
    payload.validate()?;
    Ok(Json(state.db.update_item(id, &payload).await?))
}

/// DELETE /api/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    state.db.delete_item(id).await?;
    Ok(Json(json!({ "message": "Item deleted" })))
}
