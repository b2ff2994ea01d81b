//! Schema for the catalog, order and image collections.

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_books;
mod m20250101_000002_create_images;
mod m20250101_000003_create_orders;
mod m20250101_000004_create_audit_logs;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_books::Migration),
            Box::new(m20250101_000002_create_images::Migration),
            Box::new(m20250101_000003_create_orders::Migration),
            Box::new(m20250101_000004_create_audit_logs::Migration),
        ]
    }
}
