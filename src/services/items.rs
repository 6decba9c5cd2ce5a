use metrics::counter;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{access, Principal},
    db::DbPool,
    entities::{item, storage_box, PackingMode},
    errors::ServiceError,
    repositories::{BoxRepository, ItemChanges, ItemRepository, NewItem},
};

use super::{check_item_name, check_quantity};

/// Payload for adding an item to a sort-packed box.
#[derive(Debug, Clone, Default)]
pub struct NewItemInput {
    pub name: String,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

/// Item operations. Access always resolves through the parent box.
#[derive(Debug, Clone)]
pub struct ItemService {
    boxes: BoxRepository,
    items: ItemRepository,
}

impl ItemService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            boxes: BoxRepository::new(db_pool.clone()),
            items: ItemRepository::new(db_pool),
        }
    }

    async fn accessible_box(
        &self,
        principal: &Principal,
        box_id: Uuid,
    ) -> Result<storage_box::Model, ServiceError> {
        let found = self
            .boxes
            .find_active(box_id)
            .await?
            .ok_or_else(ServiceError::box_not_found)?;
        access::authorize_box(principal, box_id, found.user_id)?;
        Ok(found)
    }

    async fn accessible_item(
        &self,
        principal: &Principal,
        item_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        let (found, parent) = self
            .items
            .find_with_box(item_id)
            .await?
            .ok_or_else(ServiceError::item_not_found)?;
        access::authorize_item(principal, item_id, parent.user_id)?;
        Ok(found)
    }

    /// Authorizes against the owner only, for writes that never need the row.
    async fn authorize_item_owner(
        &self,
        principal: &Principal,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        let owner = self
            .items
            .find_owner_of_item(item_id)
            .await?
            .ok_or_else(ServiceError::item_not_found)?;
        access::authorize_item(principal, item_id, owner)
    }

    /// Adds an item. Only sort-packed boxes accept items; a self-packed box
    /// is a domain rule violation for every caller, staff included.
    #[instrument(skip(self))]
    pub async fn add_item(
        &self,
        principal: &Principal,
        box_id: Uuid,
        input: NewItemInput,
    ) -> Result<Uuid, ServiceError> {
        check_item_name(&input.name, "name")?;
        let quantity = input.quantity.unwrap_or(1);
        check_quantity(quantity)?;

        let parent = self.accessible_box(principal, box_id).await?;
        if parent.mode()? != PackingMode::Sort {
            return Err(ServiceError::DomainRuleViolation(
                "only sort-packed boxes accept items".to_string(),
            ));
        }

        let created = self
            .items
            .create(
                box_id,
                NewItem {
                    name: input.name,
                    description: input.description.unwrap_or_default(),
                    quantity,
                    image_url: input.image_url.unwrap_or_default(),
                },
            )
            .await?;

        counter!("storage.items.created", 1);
        info!(item_id = %created.id, %box_id, user_id = %principal.user_id, "item added");
        Ok(created.id)
    }

    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        principal: &Principal,
        box_id: Uuid,
    ) -> Result<Vec<item::Model>, ServiceError> {
        self.accessible_box(principal, box_id).await?;
        self.items.list_by_box(box_id).await
    }

    #[instrument(skip(self))]
    pub async fn get_item(
        &self,
        principal: &Principal,
        item_id: Uuid,
    ) -> Result<item::Model, ServiceError> {
        self.accessible_item(principal, item_id).await
    }

    /// Partial update; absent fields keep their stored values.
    #[instrument(skip(self))]
    pub async fn update_item(
        &self,
        principal: &Principal,
        item_id: Uuid,
        changes: ItemChanges,
    ) -> Result<item::Model, ServiceError> {
        check_changes(&changes)?;
        self.authorize_item_owner(principal, item_id).await?;
        self.apply(principal, item_id, changes).await
    }

    /// Same as [`update_item`](Self::update_item) but the item must also
    /// belong to `box_id`.
    #[instrument(skip(self))]
    pub async fn update_item_in_box(
        &self,
        principal: &Principal,
        box_id: Uuid,
        item_id: Uuid,
        changes: ItemChanges,
    ) -> Result<item::Model, ServiceError> {
        check_changes(&changes)?;
        let found = self.accessible_item(principal, item_id).await?;
        if found.box_id != box_id {
            return Err(ServiceError::item_not_found());
        }
        self.apply(principal, item_id, changes).await
    }

    /// Writes the changes, then reads the item back. The item or its box may
    /// be deleted after authorization, in which case nothing is written.
    async fn apply(
        &self,
        principal: &Principal,
        item_id: Uuid,
        changes: ItemChanges,
    ) -> Result<item::Model, ServiceError> {
        if self.items.update(item_id, changes).await? == 0 {
            return Err(ServiceError::item_not_found());
        }
        let (updated, _) = self
            .items
            .find_with_box(item_id)
            .await?
            .ok_or_else(ServiceError::item_not_found)?;

        counter!("storage.items.updated", 1);
        info!(
            item_id = %updated.id,
            box_id = %updated.box_id,
            user_id = %principal.user_id,
            "item updated"
        );
        Ok(updated)
    }

    /// Soft-deletes an item. A second delete reports not found.
    #[instrument(skip(self))]
    pub async fn delete_item(
        &self,
        principal: &Principal,
        item_id: Uuid,
    ) -> Result<(), ServiceError> {
        self.authorize_item_owner(principal, item_id).await?;

        if self.items.soft_delete(item_id).await? == 0 {
            return Err(ServiceError::item_not_found());
        }

        counter!("storage.items.deleted", 1);
        info!(%item_id, user_id = %principal.user_id, "item deleted");
        Ok(())
    }
}

fn check_changes(changes: &ItemChanges) -> Result<(), ServiceError> {
    if let Some(name) = &changes.name {
        check_item_name(name, "name")?;
    }
    if let Some(quantity) = changes.quantity {
        check_quantity(quantity)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;
    use crate::services::BoxService;
    use assert_matches::assert_matches;
    use sea_orm::EntityTrait;

    struct Fixture {
        db: Arc<DbPool>,
        boxes: BoxService,
        items: ItemService,
        owner: Principal,
    }

    async fn fixture() -> Fixture {
        let db = Arc::new(memory_db().await);
        Fixture {
            boxes: BoxService::new(db.clone()),
            items: ItemService::new(db.clone()),
            owner: Principal::customer(Uuid::new_v4()),
            db,
        }
    }

    fn named(name: &str) -> NewItemInput {
        NewItemInput {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn add_list_delete_round() {
        let f = fixture().await;
        let box_id = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();

        let item_id = f.items.add_item(&f.owner, box_id, named("Book")).await.unwrap();
        let listed = f.items.list_items(&f.owner, box_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Book");
        assert_eq!(listed[0].quantity, 1);

        f.items.delete_item(&f.owner, item_id).await.unwrap();
        assert!(f.items.list_items(&f.owner, box_id).await.unwrap().is_empty());
        assert_matches!(
            f.items.delete_item(&f.owner, item_id).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn self_box_rejects_items_even_from_staff() {
        let f = fixture().await;
        let box_id = f
            .boxes
            .create_box(&f.owner, "self", Some("Lamp".into()), None)
            .await
            .unwrap();

        for caller in [f.owner, Principal::employee(Uuid::new_v4())] {
            assert_matches!(
                f.items.add_item(&caller, box_id, named("Extra")).await,
                Err(ServiceError::DomainRuleViolation(_))
            );
        }
        assert_eq!(f.items.list_items(&f.owner, box_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_payloads_are_rejected_before_lookup() {
        let f = fixture().await;
        let missing_box = Uuid::new_v4();

        assert_matches!(
            f.items.add_item(&f.owner, missing_box, named("")).await,
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            f.items
                .add_item(
                    &f.owner,
                    missing_box,
                    NewItemInput {
                        name: "Chair".into(),
                        quantity: Some(0),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::ValidationError(_))
        );
    }

    #[tokio::test]
    async fn quantity_only_update_keeps_other_fields() {
        let f = fixture().await;
        let box_id = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let item_id = f
            .items
            .add_item(
                &f.owner,
                box_id,
                NewItemInput {
                    name: "Skis".into(),
                    description: Some("pair".into()),
                    quantity: Some(1),
                    image_url: Some("https://img.example/skis.png".into()),
                },
            )
            .await
            .unwrap();

        f.items
            .update_item(
                &f.owner,
                item_id,
                ItemChanges {
                    quantity: Some(2),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let item = f.items.get_item(&f.owner, item_id).await.unwrap();
        assert_eq!(item.quantity, 2);
        assert_eq!(item.name, "Skis");
        assert_eq!(item.description, "pair");
        assert_eq!(item.image_url, "https://img.example/skis.png");
    }

    #[tokio::test]
    async fn item_access_follows_box_owner() {
        let f = fixture().await;
        let box_id = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let item_id = f.items.add_item(&f.owner, box_id, named("Vase")).await.unwrap();
        let stranger = Principal::customer(Uuid::new_v4());

        assert_matches!(
            f.items.get_item(&stranger, item_id).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            f.items.list_items(&stranger, box_id).await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            f.items.add_item(&stranger, box_id, named("Sneaky")).await,
            Err(ServiceError::NotFound(_))
        );
        assert!(f
            .items
            .get_item(&Principal::employee(Uuid::new_v4()), item_id)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn items_freeze_once_box_is_deleted() {
        let f = fixture().await;
        let box_id = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let item_id = f.items.add_item(&f.owner, box_id, named("Rug")).await.unwrap();

        f.boxes.delete_box(&f.owner, box_id).await.unwrap();

        assert_matches!(
            f.items
                .update_item(
                    &f.owner,
                    item_id,
                    ItemChanges {
                        name: Some("Carpet".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound(_))
        );
        assert_matches!(
            f.items.add_item(&f.owner, box_id, named("More")).await,
            Err(ServiceError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn box_scoped_update_requires_matching_box() {
        let f = fixture().await;
        let first = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let second = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let item_id = f.items.add_item(&f.owner, first, named("Mug")).await.unwrap();
        let rename = ItemChanges {
            name: Some("Cup".into()),
            ..Default::default()
        };

        assert_matches!(
            f.items
                .update_item_in_box(&f.owner, second, item_id, rename.clone())
                .await,
            Err(ServiceError::NotFound(_))
        );
        let updated = f
            .items
            .update_item_in_box(&f.owner, first, item_id, rename)
            .await
            .unwrap();
        assert_eq!(updated.name, "Cup");
    }

    #[tokio::test]
    async fn write_after_box_deletion_changes_nothing() {
        let f = fixture().await;
        let box_id = f.boxes.create_box(&f.owner, "sort", None, None).await.unwrap();
        let item_id = f.items.add_item(&f.owner, box_id, named("Lamp")).await.unwrap();

        f.items
            .authorize_item_owner(&f.owner, item_id)
            .await
            .unwrap();
        f.boxes.delete_box(&f.owner, box_id).await.unwrap();

        assert_matches!(
            f.items
                .apply(
                    &f.owner,
                    item_id,
                    ItemChanges {
                        name: Some("Shade".into()),
                        ..Default::default()
                    }
                )
                .await,
            Err(ServiceError::NotFound(_))
        );
        let stored = item::Entity::find_by_id(item_id)
            .one(f.db.as_ref())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.name, "Lamp");
    }
}
