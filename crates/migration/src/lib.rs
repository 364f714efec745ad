//! Migrator for the document table backing the PostgreSQL store.
//! Indexes are applied last.
pub use sea_orm_migration::prelude::*;

mod m20241027_000001_create_documents;
mod m20241027_000002_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241027_000001_create_documents::Migration),
            // Indexes should always be applied last
            Box::new(m20241027_000002_add_indexes::Migration),
        ]
    }
}
