use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Query},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::timed;
use crate::entities::{item, storage_box};
use crate::errors::ServiceError;
use crate::repositories::Repository;

use super::BaseRepository;

/// Fields of an item about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewItem {
    pub name: String,
    pub description: String,
    pub quantity: i32,
    pub image_url: String,
}

impl NewItem {
    pub(crate) fn into_active_model(self, box_id: Uuid) -> item::ActiveModel {
        item::ActiveModel {
            id: Set(Uuid::new_v4()),
            box_id: Set(box_id),
            name: Set(self.name),
            description: Set(self.description),
            quantity: Set(self.quantity),
            image_url: Set(self.image_url),
            deleted_at: Set(None),
            ..Default::default()
        }
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i32>,
    pub image_url: Option<String>,
}

/// Entity store for items. Every read excludes soft-deleted items and items
/// whose parent box is soft-deleted.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    base: BaseRepository,
}

impl ItemRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn create(
        &self,
        box_id: Uuid,
        new_item: NewItem,
    ) -> Result<item::Model, ServiceError> {
        Self::insert_with(self.base.get_db(), box_id, new_item).await
    }

    /// Inserts on any connection, so callers can run it inside a transaction.
    pub(crate) async fn insert_with<C>(
        conn: &C,
        box_id: Uuid,
        new_item: NewItem,
    ) -> Result<item::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        timed("items.insert", new_item.into_active_model(box_id).insert(conn)).await
    }

    /// Live items of a box, oldest first.
    pub async fn list_by_box(&self, box_id: Uuid) -> Result<Vec<item::Model>, ServiceError> {
        timed(
            "items.list_by_box",
            item::Entity::find()
                .filter(item::Column::BoxId.eq(box_id))
                .filter(item::Column::DeletedAt.is_null())
                .order_by_asc(item::Column::CreatedAt)
                .all(self.base.get_db()),
        )
        .await
    }

    /// Live items for several boxes at once.
    pub(crate) async fn list_for_boxes<C>(
        conn: &C,
        box_ids: Vec<Uuid>,
    ) -> Result<Vec<item::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        if box_ids.is_empty() {
            return Ok(Vec::new());
        }
        timed(
            "items.list_for_boxes",
            item::Entity::find()
                .filter(item::Column::BoxId.is_in(box_ids))
                .filter(item::Column::DeletedAt.is_null())
                .order_by_asc(item::Column::CreatedAt)
                .all(conn),
        )
        .await
    }

    /// Resolves an item together with its parent box. Returns `None` when
    /// either the item or the box is missing or soft-deleted.
    pub async fn find_with_box(
        &self,
        item_id: Uuid,
    ) -> Result<Option<(item::Model, storage_box::Model)>, ServiceError> {
        let row = timed(
            "items.find_with_box",
            item::Entity::find_by_id(item_id)
                .filter(item::Column::DeletedAt.is_null())
                .find_also_related(storage_box::Entity)
                .filter(storage_box::Column::DeletedAt.is_null())
                .one(self.base.get_db()),
        )
        .await?;

        Ok(match row {
            Some((item, Some(parent))) => Some((item, parent)),
            _ => None,
        })
    }

    /// Owner of the box an item belongs to.
    pub async fn find_owner_of_item(&self, item_id: Uuid) -> Result<Option<Uuid>, ServiceError> {
        Ok(self
            .find_with_box(item_id)
            .await?
            .map(|(_, parent)| parent.user_id))
    }

    /// Applies only the fields present in `changes`. The write matches only a
    /// live item in a live box; zero rows changed means the item is gone.
    pub async fn update(&self, item_id: Uuid, changes: ItemChanges) -> Result<u64, ServiceError> {
        let live_boxes = Query::select()
            .column(storage_box::Column::Id)
            .from(storage_box::Entity)
            .and_where(storage_box::Column::DeletedAt.is_null())
            .to_owned();

        let mut update = item::Entity::update_many()
            .col_expr(item::Column::UpdatedAt, Expr::value(Utc::now()));
        if let Some(name) = changes.name {
            update = update.col_expr(item::Column::Name, Expr::value(name));
        }
        if let Some(description) = changes.description {
            update = update.col_expr(item::Column::Description, Expr::value(description));
        }
        if let Some(quantity) = changes.quantity {
            update = update.col_expr(item::Column::Quantity, Expr::value(quantity));
        }
        if let Some(image_url) = changes.image_url {
            update = update.col_expr(item::Column::ImageUrl, Expr::value(image_url));
        }

        let result = timed(
            "items.update",
            update
                .filter(item::Column::Id.eq(item_id))
                .filter(item::Column::DeletedAt.is_null())
                .filter(item::Column::BoxId.in_subquery(live_boxes))
                .exec(self.base.get_db()),
        )
        .await?;

        Ok(result.rows_affected)
    }

    /// Marks an item deleted. Returns the number of rows changed, which is zero
    /// when the item was already deleted.
    pub async fn soft_delete(&self, item_id: Uuid) -> Result<u64, ServiceError> {
        let now = Utc::now();
        let result = timed(
            "items.soft_delete",
            item::Entity::update_many()
                .col_expr(item::Column::DeletedAt, Expr::value(Some(now)))
                .col_expr(item::Column::UpdatedAt, Expr::value(now))
                .filter(item::Column::Id.eq(item_id))
                .filter(item::Column::DeletedAt.is_null())
                .exec(self.base.get_db()),
        )
        .await?;

        Ok(result.rows_affected)
    }
}
