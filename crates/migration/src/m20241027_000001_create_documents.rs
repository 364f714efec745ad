//! Create `documents` table.
//!
//! One JSON body per `(collection, key)`; the composite key doubles as the
//! native ordering of every collection scan. Keys use the "C" collation so
//! they sort byte-wise.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Documents::Table)
                    .if_not_exists()
                    .col(string_len(Documents::Collection, 128).not_null())
                    .col(string_len(Documents::Key, 512).not_null().extra(r#"COLLATE "C""#))
                    .col(json_binary(Documents::Data).not_null())
                    .col(timestamp_with_time_zone(Documents::UpdatedAt).not_null())
                    .primary_key(
                        Index::create()
                            .name("pk_documents")
                            .col(Documents::Collection)
                            .col(Documents::Key),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Documents::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Documents { Table, Collection, Key, Data, UpdatedAt }
