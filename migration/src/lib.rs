pub use sea_orm_migration::prelude::*;

mod m20250101_000001_directory;
mod m20250101_000002_assignments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_directory::Migration),
            Box::new(m20250101_000002_assignments::Migration),
        ]
    }
}
