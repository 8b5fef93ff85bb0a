pub use sea_orm_migration::prelude::*;

mod m20250601_000001_roles_and_users;
mod m20250601_000002_catalog;
mod m20250601_000003_profile;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_roles_and_users::Migration),
            Box::new(m20250601_000002_catalog::Migration),
            Box::new(m20250601_000003_profile::Migration),
        ]
    }
}
