use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "restaurant")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub category: Option<String>,
    pub address: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub location: Option<Json>,
    pub image_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub menu_info: Option<Json>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub opening_hours: Option<Json>,
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
