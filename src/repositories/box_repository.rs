use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::db::timed;
use crate::entities::{item, storage_box, BoxStatus, PackingMode};
use crate::errors::ServiceError;
use crate::repositories::{ItemRepository, NewItem, Repository};

use super::BaseRepository;

/// A live box with its live items attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxWithItems {
    pub storage_box: storage_box::Model,
    pub items: Vec<item::Model>,
}

/// Entity store for boxes. Every read excludes soft-deleted rows.
#[derive(Debug, Clone)]
pub struct BoxRepository {
    base: BaseRepository,
}

impl BoxRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Inserts a box in `pending_pickup`, plus its declared item when one is
    /// given. Both rows commit together or not at all.
    pub async fn create(
        &self,
        owner_id: Uuid,
        packing_mode: PackingMode,
        declared_item: Option<NewItem>,
    ) -> Result<storage_box::Model, ServiceError> {
        let txn = self.base.get_db().begin().await?;

        let new_box = storage_box::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(owner_id),
            packing_mode: Set(packing_mode.to_string()),
            status: Set(BoxStatus::PendingPickup),
            location_id: Set(None),
            deleted_at: Set(None),
            ..Default::default()
        };
        let created = timed("boxes.insert", new_box.insert(&txn)).await?;

        if let Some(declared) = declared_item {
            let inserted = ItemRepository::insert_with(&txn, created.id, declared).await?;
            debug!(box_id = %created.id, item_id = %inserted.id, "declared item staged");
        }

        txn.commit().await?;
        Ok(created)
    }

    pub async fn find_active(&self, id: Uuid) -> Result<Option<storage_box::Model>, ServiceError> {
        timed(
            "boxes.find_active",
            storage_box::Entity::find_by_id(id)
                .filter(storage_box::Column::DeletedAt.is_null())
                .one(self.base.get_db()),
        )
        .await
    }

    /// The caller's live boxes, newest first, each with its live items.
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<BoxWithItems>, ServiceError> {
        let boxes = timed(
            "boxes.list_by_owner",
            storage_box::Entity::find()
                .filter(storage_box::Column::UserId.eq(owner_id))
                .filter(storage_box::Column::DeletedAt.is_null())
                .order_by_desc(storage_box::Column::CreatedAt)
                .all(self.base.get_db()),
        )
        .await?;

        let ids = boxes.iter().map(|b| b.id).collect::<Vec<_>>();
        let items = ItemRepository::list_for_boxes(self.base.get_db(), ids).await?;

        let mut by_box: HashMap<Uuid, Vec<item::Model>> = HashMap::new();
        for it in items {
            by_box.entry(it.box_id).or_default().push(it);
        }

        Ok(boxes
            .into_iter()
            .map(|b| BoxWithItems {
                items: by_box.remove(&b.id).unwrap_or_default(),
                storage_box: b,
            })
            .collect())
    }

    /// Writes only the status column. Returns rows changed.
    pub async fn update_status(&self, id: Uuid, status: BoxStatus) -> Result<u64, ServiceError> {
        let result = timed(
            "boxes.update_status",
            storage_box::Entity::update_many()
                .col_expr(storage_box::Column::Status, Expr::value(status.to_value()))
                .col_expr(storage_box::Column::UpdatedAt, Expr::value(Utc::now()))
                .filter(storage_box::Column::Id.eq(id))
                .filter(storage_box::Column::DeletedAt.is_null())
                .exec(self.base.get_db()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Marks a box deleted. Zero rows changed means it was already gone.
    pub async fn soft_delete(&self, id: Uuid) -> Result<u64, ServiceError> {
        let now = Utc::now();
        let result = timed(
            "boxes.soft_delete",
            storage_box::Entity::update_many()
                .col_expr(storage_box::Column::DeletedAt, Expr::value(Some(now)))
                .col_expr(storage_box::Column::UpdatedAt, Expr::value(now))
                .filter(storage_box::Column::Id.eq(id))
                .filter(storage_box::Column::DeletedAt.is_null())
                .exec(self.base.get_db()),
        )
        .await?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::memory_db;
    use assert_matches::assert_matches;
    use sea_orm::{ConnectionTrait, PaginatorTrait};

    async fn repo() -> BoxRepository {
        BoxRepository::new(Arc::new(memory_db().await))
    }

    #[tokio::test]
    async fn self_packed_box_is_stored_with_its_item() {
        let repo = repo().await;
        let owner = Uuid::new_v4();
        let created = repo
            .create(
                owner,
                PackingMode::SelfPacked,
                Some(NewItem {
                    name: "Winter coats".into(),
                    description: "two coats".into(),
                    quantity: 1,
                    image_url: String::new(),
                }),
            )
            .await
            .unwrap();

        assert_eq!(created.status, BoxStatus::PendingPickup);
        let listed = repo.list_by_owner(owner).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].items.len(), 1);
        assert_eq!(listed[0].items[0].name, "Winter coats");

        let reloaded = repo.find_active(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.packing_mode, "self");
        assert_eq!(reloaded.mode().unwrap(), PackingMode::SelfPacked);
    }

    #[tokio::test]
    async fn failed_item_insert_leaves_no_box_behind() {
        let db = Arc::new(memory_db().await);
        db.execute_unprepared("DROP TABLE items").await.unwrap();
        let repo = BoxRepository::new(db.clone());

        let result = repo
            .create(
                Uuid::new_v4(),
                PackingMode::SelfPacked,
                Some(NewItem {
                    name: "Bicycle".into(),
                    description: String::new(),
                    quantity: 1,
                    image_url: String::new(),
                }),
            )
            .await;

        assert_matches!(result, Err(ServiceError::DatabaseError(_)));
        assert_eq!(storage_box::Entity::find().count(db.as_ref()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn list_is_scoped_to_owner() {
        let repo = repo().await;
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        repo.create(alice, PackingMode::Sort, None).await.unwrap();
        repo.create(bob, PackingMode::Sort, None).await.unwrap();

        let listed = repo.list_by_owner(alice).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].storage_box.user_id, alice);
        assert!(listed[0].items.is_empty());
    }

    #[tokio::test]
    async fn status_update_writes_only_status() {
        let repo = repo().await;
        let created = repo
            .create(Uuid::new_v4(), PackingMode::Sort, None)
            .await
            .unwrap();

        assert_eq!(
            repo.update_status(created.id, BoxStatus::InTransit)
                .await
                .unwrap(),
            1
        );
        let reloaded = repo.find_active(created.id).await.unwrap().unwrap();
        assert_eq!(reloaded.status, BoxStatus::InTransit);
        assert_eq!(reloaded.mode().unwrap(), PackingMode::Sort);
        assert_eq!(reloaded.user_id, created.user_id);
    }

    #[tokio::test]
    async fn deleted_box_disappears_from_every_read() {
        let repo = repo().await;
        let owner = Uuid::new_v4();
        let created = repo.create(owner, PackingMode::Sort, None).await.unwrap();

        assert_eq!(repo.soft_delete(created.id).await.unwrap(), 1);
        assert_eq!(repo.soft_delete(created.id).await.unwrap(), 0);
        assert!(repo.find_active(created.id).await.unwrap().is_none());
        assert!(repo.list_by_owner(owner).await.unwrap().is_empty());
        assert_eq!(
            repo.update_status(created.id, BoxStatus::Disposed)
                .await
                .unwrap(),
            0
        );
    }
}
