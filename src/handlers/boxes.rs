use axum::{
    extract::{Path, State},
    response::Response,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::common::{created_response, message_response, parse_id, success_response, ApiJson};
use super::items::ItemView;
use crate::{
    auth::Principal,
    entities::{BoxStatus, PackingMode},
    errors::ServiceError,
    repositories::BoxWithItems,
    AppState,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[schema(example = json!({
    "packing_mode": "self",
    "item_name": "Winter clothes",
    "item_note": "two coats, one scarf"
}))]
pub struct CreateBoxRequest {
    /// `self` (declare the single item now) or `sort` (staff add items later)
    #[schema(example = "sort")]
    pub packing_mode: String,
    /// Required for self-packed boxes, ignored for sort-packed ones
    #[validate(length(max = 100))]
    pub item_name: Option<String>,
    pub item_note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({"status": "in_transit"}))]
pub struct UpdateStatusRequest {
    /// One of pending_pickup, pending_pack, in_transit, stored, returned, disposed
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoxView {
    pub id: Uuid,
    pub packing_mode: PackingMode,
    pub status: BoxStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_id: Option<Uuid>,
    pub items: Vec<ItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BoxWithItems> for BoxView {
    type Error = ServiceError;

    fn try_from(value: BoxWithItems) -> Result<Self, Self::Error> {
        let b = value.storage_box;
        Ok(Self {
            id: b.id,
            packing_mode: b.mode()?,
            status: b.status,
            location_id: b.location_id,
            items: value.items.into_iter().map(ItemView::from).collect(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoxListResponse {
    pub boxes: Vec<BoxView>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BoxResponse {
    #[serde(rename = "box")]
    pub storage_box: BoxView,
}

#[utoipa::path(
    post,
    path = "/api/v1/boxes",
    request_body = CreateBoxRequest,
    responses(
        (status = 201, description = "Box created", body = super::common::CreatedResponse),
        (status = 400, description = "Invalid packing mode or payload", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "boxes"
)]
pub async fn create_box(
    State(state): State<AppState>,
    principal: Principal,
    ApiJson(payload): ApiJson<CreateBoxRequest>,
) -> Result<Response, ServiceError> {
    payload.validate()?;

    let id = state
        .box_service
        .create_box(
            &principal,
            &payload.packing_mode,
            payload.item_name,
            payload.item_note,
        )
        .await?;

    Ok(created_response(id))
}

#[utoipa::path(
    get,
    path = "/api/v1/boxes",
    responses(
        (status = 200, description = "The caller's boxes with their items", body = BoxListResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "boxes"
)]
pub async fn list_boxes(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, ServiceError> {
    let boxes = state.box_service.list_boxes(&principal).await?;

    Ok(success_response(BoxListResponse {
        boxes: boxes
            .into_iter()
            .map(BoxView::try_from)
            .collect::<Result<_, _>>()?,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/boxes/{id}",
    params(("id" = String, Path, description = "Box ID")),
    responses(
        (status = 200, description = "Box with items", body = BoxResponse),
        (status = 400, description = "Malformed ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Box not found or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "boxes"
)]
pub async fn get_box(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    let found = state.box_service.get_box(&principal, box_id).await?;

    Ok(success_response(BoxResponse {
        storage_box: found.try_into()?,
    }))
}

#[utoipa::path(
    patch,
    path = "/api/v1/boxes/{id}/status",
    params(("id" = String, Path, description = "Box ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = super::common::MessageResponse),
        (status = 400, description = "Malformed ID or unknown status", body = crate::errors::ErrorResponse),
        (status = 403, description = "Status reserved for employees", body = crate::errors::ErrorResponse),
        (status = 404, description = "Box not found or not accessible", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "boxes"
)]
pub async fn update_box_status(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateStatusRequest>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    state
        .box_service
        .update_status(&principal, box_id, &payload.status)
        .await?;

    Ok(message_response("Box status updated"))
}

#[utoipa::path(
    delete,
    path = "/api/v1/boxes/{id}",
    params(("id" = String, Path, description = "Box ID")),
    responses(
        (status = 200, description = "Box deleted", body = super::common::MessageResponse),
        (status = 400, description = "Malformed ID", body = crate::errors::ErrorResponse),
        (status = 404, description = "Box not found, not accessible or already deleted", body = crate::errors::ErrorResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "boxes"
)]
pub async fn delete_box(
    State(state): State<AppState>,
    principal: Principal,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let box_id = parse_id(&id, "box")?;
    state.box_service.delete_box(&principal, box_id).await?;

    Ok(message_response("Box deleted"))
}
