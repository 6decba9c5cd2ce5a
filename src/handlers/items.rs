use axum::{
    extract::{Path, State},
    response::Response,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, message_response, parse_id, success_response, ApiJson};
use crate::{
    auth::Principal,
    entities::item,
    errors::ServiceError,
    repositories::ItemChanges,
    services::NewItemInput,
    AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "5f0c7c4e-2d61-4f53-9b1e-6a7d3c2b1a00",
    "name": "Book",
    "description": "hardcover",
    "quantity": 1,
    "image_url": "https://img.example/book.png"
}))]
pub struct ItemView {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub image_url: String,
}

impl From<item::Model> for ItemView {
    fn from(model: item::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            quantity: model.quantity,
            image_url: model.image_url,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "name": "Book",
    "description": "hardcover",
    "quantity": 1,
    "image_url": "https://img.example/book.png"
}))]
pub struct AddItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub description: Option<String>,
    /// Defaults to 1
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

impl From<AddItemRequest> for NewItemInput {
    fn from(req: AddItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            image_url: req.image_url,
        }
    }
}

/// Only the fields present in the body are changed.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[schema(example = json!({"quantity": 2}))]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 1))]
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

impl From<UpdateItemRequest> for ItemChanges {
    fn from(req: UpdateItemRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
            quantity: req.quantity,
            image_url: req.image_url,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub items: Vec<ItemView>,
}

#[utoipa::path(
    post,
    path = "/api/v1/boxes/{id}/items",
    params(("id" = String, Path, description = "Box ID")),
    request_body = AddItemRequest,
    responses(
        (status = 201, description = "Item added", body = super::common::CreatedResponse),
        (status = 400, description = "Malformed ID or invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Box not found or not accessible", body = crate::errors::ErrorResponse),
        (status = 422, description = "Box is not sort-packed", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn add_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<AddItemRequest>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    payload.validate()?;

    let item_id = state
        .item_service
        .add_item(&principal, box_id, payload.into())
        .await?;

    Ok(created_response(item_id))
}

#[utoipa::path(
    get,
    path = "/api/v1/boxes/{id}/items",
    params(("id" = String, Path, description = "Box ID")),
    responses(
        (status = 200, description = "Live items of the box", body = ItemListResponse),
        (status = 400, description = "Malformed ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Box not found or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    let items = state.item_service.list_items(&principal, box_id).await?;

    Ok(success_response(ItemListResponse {
        items: items.into_iter().map(ItemView::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/boxes/{id}/items/{item_id}",
    params(
        ("id" = String, Path, description = "Box ID"),
        ("item_id" = String, Path, description = "Item ID")
    ),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = super::common::MessageResponse),
        (status = 400, description = "Malformed ID or invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not in this box or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_box_item(
    State(state): State<AppState>,
    principal: Principal,
    Path((id, item_id)): Path<(String, String)>,
    ApiJson(payload): ApiJson<UpdateItemRequest>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    let item_id = parse_id(&item_id, "item")?;
    payload.validate()?;

    state
        .item_service
        .update_item_in_box(&principal, box_id, item_id, payload.into())
        .await?;

    Ok(message_response("Item updated successfully"))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item", body = ItemView),
        (status = 400, description = "Malformed ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let item_id = parse_id(&id, "item")?;
    let found = state.item_service.get_item(&principal, item_id).await?;

    Ok(success_response(ItemView::from(found)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = super::common::MessageResponse),
        (status = 400, description = "Malformed ID or invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateItemRequest>,
) -> Result<Response, ServiceError> {
    let item_id = parse_id(&id, "item")?;
    payload.validate()?;

    state
        .item_service
        .update_item(&principal, item_id, payload.into())
        .await?;

    Ok(message_response("Item updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    params(("id" = String, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item deleted", body = super::common::MessageResponse),
        (status = 400, description = "Malformed ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found, not accessible or already deleted", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let item_id = parse_id(&id, "item")?;
    state.item_service.delete_item(&principal, item_id).await?;

    Ok(message_response("Item deleted successfully"))
}
