use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_boxes_table::Migration),
            Box::new(m20240301_000002_create_items_table::Migration),
        ]
    }
}

mod m20240301_000001_create_boxes_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_boxes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Boxes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Boxes::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Boxes::UserId).uuid().not_null())
                        .col(ColumnDef::new(Boxes::PackingMode).string_len(16).not_null())
                        .col(ColumnDef::new(Boxes::Status).string_len(32).not_null())
                        .col(ColumnDef::new(Boxes::LocationId).uuid().null())
                        .col(
                            ColumnDef::new(Boxes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Boxes::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Boxes::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_boxes_user_id")
                        .table(Boxes::Table)
                        .col(Boxes::UserId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Boxes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Boxes {
        Table,
        Id,
        UserId,
        PackingMode,
        Status,
        LocationId,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000002_create_items_table {
    use super::m20240301_000001_create_boxes_table::Boxes;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Items::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Items::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Items::BoxId).uuid().not_null())
                        .col(ColumnDef::new(Items::Name).string_len(100).not_null())
                        .col(
                            ColumnDef::new(Items::Description)
                                .text()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Items::Quantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(Items::ImageUrl)
                                .string()
                                .not_null()
                                .default(""),
                        )
                        .col(
                            ColumnDef::new(Items::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Items::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_items_box_id")
                                .from(Items::Table, Items::BoxId)
                                .to(Boxes::Table, Boxes::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_items_box_id")
                        .table(Items::Table)
                        .col(Items::BoxId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Items::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Items {
        Table,
        Id,
        BoxId,
        Name,
        Description,
        Quantity,
        ImageUrl,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}
