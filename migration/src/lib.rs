pub use sea_orm_migration::prelude::*;

mod m20250601_000001_initial;
mod m20250614_000001_add_bids;
mod m20250702_000001_add_prizes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_initial::Migration),
            Box::new(m20250614_000001_add_bids::Migration),
            Box::new(m20250702_000001_add_prizes::Migration),
        ]
    }
}
