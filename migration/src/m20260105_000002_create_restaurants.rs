use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Restaurant::Table)
                    .if_not_exists()
                    .col(uuid(Restaurant::Id).primary_key())
                    .col(string_len(Restaurant::Name, 200).not_null())
                    .col(string_len_null(Restaurant::Category, 100))
                    .col(text_null(Restaurant::Address))
                    // GeoJSON point; older rows may hold WKT or {lat, lng}
                    .col(json_binary_null(Restaurant::Location))
                    .col(text_null(Restaurant::ImageUrl))
                    .col(json_binary_null(Restaurant::MenuInfo))
                    .col(json_binary_null(Restaurant::OpeningHours))
                    .col(
                        timestamp_with_time_zone(Restaurant::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_restaurant_created_at")
                    .table(Restaurant::Table)
                    .col(Restaurant::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Restaurant::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Restaurant {
    Table,
    Id,
    Name,
    Category,
    Address,
    Location,
    ImageUrl,
    MenuInfo,
    OpeningHours,
    CreatedAt,
}
