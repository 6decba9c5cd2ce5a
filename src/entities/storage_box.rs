use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::{entity::prelude::*, ActiveValue::Set};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// How a box gets its contents. Fixed at creation.
///
/// Stored in `boxes.packing_mode` under its wire name (`self` or `sort`).
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
pub enum PackingMode {
    /// The owner declares a single item when creating the box.
    #[serde(rename = "self")]
    #[strum(serialize = "self")]
    SelfPacked,
    /// Staff add items after pickup.
    #[serde(rename = "sort")]
    #[strum(serialize = "sort")]
    Sort,
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BoxStatus {
    #[sea_orm(string_value = "pending_pickup")]
    PendingPickup,
    #[sea_orm(string_value = "pending_pack")]
    PendingPack,
    #[sea_orm(string_value = "in_transit")]
    InTransit,
    #[sea_orm(string_value = "stored")]
    Stored,
    #[sea_orm(string_value = "returned")]
    Returned,
    #[sea_orm(string_value = "disposed")]
    Disposed,
}

impl BoxStatus {
    /// Statuses only staff may set.
    pub fn requires_employee(self) -> bool {
        matches!(self, BoxStatus::Stored | BoxStatus::Returned)
    }
}

/// The `boxes` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boxes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    /// Wire name of a [`PackingMode`]; read it through [`Model::mode`].
    pub packing_mode: String,
    pub status: BoxStatus,
    pub location_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::item::Entity")]
    Items,
}

impl Related<super::item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        let now = Utc::now();

        if insert {
            active_model.created_at = Set(now);
        }
        active_model.updated_at = Set(now);

        Ok(active_model)
    }
}

impl Model {
    pub fn mode(&self) -> Result<PackingMode, DbErr> {
        PackingMode::from_str(&self.packing_mode)
            .map_err(|_| DbErr::Type(format!("unknown packing mode '{}'", self.packing_mode)))
    }
}
