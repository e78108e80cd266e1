pub use sea_orm_migration::prelude::*;

mod m20260105_000001_create_sources;
mod m20260105_000002_create_restaurants;
mod m20260105_000003_create_appearances;
mod m20260105_000004_create_admin_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260105_000001_create_sources::Migration),
            Box::new(m20260105_000002_create_restaurants::Migration),
            Box::new(m20260105_000003_create_appearances::Migration),
            Box::new(m20260105_000004_create_admin_users::Migration),
        ]
    }
}
