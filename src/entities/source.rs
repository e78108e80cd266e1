use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "source_type")]
pub enum SourceType {
    #[sea_orm(string_value = "TV")]
    #[serde(rename = "TV")]
    Tv,
    #[sea_orm(string_value = "YOUTUBE")]
    #[serde(rename = "YOUTUBE")]
    Youtube,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Tv => "TV",
            SourceType::Youtube => "YOUTUBE",
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "source")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub kind: SourceType,
    pub icon_url: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::appearance::Entity")]
    Appearances,
}

impl Related<super::appearance::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Appearances.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
