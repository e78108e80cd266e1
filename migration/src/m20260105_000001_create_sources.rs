use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(SourceType::Enum)
                    .values([SourceType::Tv, SourceType::Youtube])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Source::Table)
                    .if_not_exists()
                    .col(uuid(Source::Id).primary_key())
                    .col(string_len(Source::Name, 100).not_null().unique_key())
                    .col(
                        ColumnDef::new(Source::Type)
                            .custom(SourceType::Enum)
                            .not_null(),
                    )
                    .col(text_null(Source::IconUrl))
                    .col(
                        timestamp_with_time_zone(Source::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Source::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(SourceType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Source {
    Table,
    Id,
    Name,
    Type,
    IconUrl,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum SourceType {
    #[sea_orm(iden = "source_type")]
    Enum,
    #[sea_orm(iden = "TV")]
    Tv,
    #[sea_orm(iden = "YOUTUBE")]
    Youtube,
}
