use metrics::counter;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{access, Principal},
    db::DbPool,
    entities::{BoxStatus, PackingMode},
    errors::ServiceError,
    repositories::{BoxRepository, BoxWithItems, ItemRepository, NewItem},
};

use super::check_item_name;

/// Box lifecycle: creation, status changes and soft deletion.
#[derive(Debug, Clone)]
pub struct BoxService {
    boxes: BoxRepository,
    items: ItemRepository,
}

impl BoxService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            boxes: BoxRepository::new(db_pool.clone()),
            items: ItemRepository::new(db_pool),
        }
    }

    /// Creates a box owned by the caller.
    ///
    /// Self-packed boxes get exactly one item (`item_name`, `item_note`,
    /// quantity 1) written in the same transaction. For sort-packed boxes the
    /// item fields are ignored.
    #[instrument(skip(self))]
    pub async fn create_box(
        &self,
        principal: &Principal,
        packing_mode: &str,
        item_name: Option<String>,
        item_note: Option<String>,
    ) -> Result<Uuid, ServiceError> {
        let mode = parse_packing_mode(packing_mode)?;

        let declared = match mode {
            PackingMode::SelfPacked => {
                let name = item_name.unwrap_or_default();
                check_item_name(&name, "item_name")?;
                Some(NewItem {
                    name,
                    description: item_note.unwrap_or_default(),
                    quantity: 1,
                    image_url: String::new(),
                })
            }
            PackingMode::Sort => None,
        };

        let created = self
            .boxes
            .create(principal.user_id, mode, declared)
            .await?;

        counter!("storage.boxes.created", 1, "packing_mode" => mode.to_string());
        info!(
            box_id = %created.id,
            user_id = %principal.user_id,
            packing_mode = %mode,
            "box created"
        );
        Ok(created.id)
    }

    #[instrument(skip(self))]
    pub async fn get_box(
        &self,
        principal: &Principal,
        box_id: Uuid,
    ) -> Result<BoxWithItems, ServiceError> {
        let found = self
            .boxes
            .find_active(box_id)
            .await?
            .ok_or_else(ServiceError::box_not_found)?;
        access::authorize_box(principal, box_id, found.user_id)?;

        let items = self.items.list_by_box(box_id).await?;
        Ok(BoxWithItems {
            storage_box: found,
            items,
        })
    }

    /// The caller's own boxes. Employees see only their own here as well.
    #[instrument(skip(self))]
    pub async fn list_boxes(
        &self,
        principal: &Principal,
    ) -> Result<Vec<BoxWithItems>, ServiceError> {
        self.boxes.list_by_owner(principal.user_id).await
    }

    /// Sets a box's status. The privileged-status check runs before the
    /// ownership lookup, so a customer asking for `stored` gets a forbidden
    /// error whether or not the box exists.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        principal: &Principal,
        box_id: Uuid,
        status: &str,
    ) -> Result<BoxStatus, ServiceError> {
        let status = parse_status(status)?;
        access::authorize_status_change(principal, status)?;

        let found = self
            .boxes
            .find_active(box_id)
            .await?
            .ok_or_else(ServiceError::box_not_found)?;
        access::authorize_box(principal, box_id, found.user_id)?;

        if self.boxes.update_status(box_id, status).await? == 0 {
            // deleted between lookup and write
            return Err(ServiceError::box_not_found());
        }

        counter!("storage.boxes.status_updated", 1, "status" => status.to_string());
        info!(
            %box_id,
            user_id = %principal.user_id,
            from = %found.status,
            to = %status,
            "box status updated"
        );
        Ok(status)
    }

    /// Soft-deletes a box. A second delete reports not found.
    #[instrument(skip(self))]
    pub async fn delete_box(
        &self,
        principal: &Principal,
        box_id: Uuid,
    ) -> Result<(), ServiceError> {
        let found = self
            .boxes
            .find_active(box_id)
            .await?
            .ok_or_else(ServiceError::box_not_found)?;
        access::authorize_box(principal, box_id, found.user_id)?;

        if self.boxes.soft_delete(box_id).await? == 0 {
            return Err(ServiceError::box_not_found());
        }

        counter!("storage.boxes.deleted", 1);
        info!(%box_id, user_id = %principal.user_id, "box deleted");
        Ok(())
    }
}

pub fn parse_packing_mode(raw: &str) -> Result<PackingMode, ServiceError> {
    PackingMode::from_str(raw).map_err(|_| {
        ServiceError::ValidationError(format!(
            "invalid packing_mode '{}': expected 'self' or 'sort'",
            raw
        ))
    })
}

pub fn parse_status(raw: &str) -> Result<BoxStatus, ServiceError> {
    BoxStatus::from_str(raw)
        .map_err(|_| ServiceError::ValidationError(format!("invalid status '{}'", raw)))
}
