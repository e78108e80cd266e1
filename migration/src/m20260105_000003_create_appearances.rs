use sea_orm_migration::{prelude::*, schema::*};

use super::m20260105_000001_create_sources::Source;
use super::m20260105_000002_create_restaurants::Restaurant;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appearance::Table)
                    .if_not_exists()
                    .col(uuid(Appearance::Id).primary_key())
                    .col(uuid(Appearance::RestaurantId).not_null())
                    .col(uuid(Appearance::SourceId).not_null())
                    .col(text_null(Appearance::Title))
                    .col(text_null(Appearance::VideoUrl))
                    .col(text_null(Appearance::VodUrl))
                    .col(text_null(Appearance::ThumbnailUrl))
                    .col(json_binary_null(Appearance::Metadata))
                    .col(
                        timestamp_with_time_zone(Appearance::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appearance_restaurant")
                            .from(Appearance::Table, Appearance::RestaurantId)
                            .to(Restaurant::Table, Restaurant::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    // Sources with appearances must be cleaned up by hand
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_appearance_source")
                            .from(Appearance::Table, Appearance::SourceId)
                            .to(Source::Table, Source::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appearance_restaurant_id")
                    .table(Appearance::Table)
                    .col(Appearance::RestaurantId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appearance::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Appearance {
    Table,
    Id,
    RestaurantId,
    SourceId,
    Title,
    VideoUrl,
    VodUrl,
    ThumbnailUrl,
    Metadata,
    CreatedAt,
}
