use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // Expenses: owner lookups and membership filters
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_documents_expense_oseba \
             ON documents ((data ->> 'oseba'), key) WHERE collection = 'Potni_stroski'",
        )
        .await?;

        // Expenses: month range scans on departure date
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_documents_expense_odhod \
             ON documents (((data ->> 'datum_odhoda') COLLATE \"C\")) WHERE collection = 'Potni_stroski'",
        )
        .await?;

        // Users: full-name lookups
        db.execute_unprepared(
            "CREATE INDEX IF NOT EXISTS idx_documents_user_name \
             ON documents ((data ->> 'ime'), (data ->> 'priimek')) WHERE collection = 'Uporabniki'",
        )
        .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_documents_user_name").await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_documents_expense_odhod").await?;
        db.execute_unprepared("DROP INDEX IF EXISTS idx_documents_expense_oseba").await?;
        Ok(())
    }
}
