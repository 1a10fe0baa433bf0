//! Exchange rate cache migration.
//!
//! Creates the durable tier of the rate cache. The DDL is portable across
//! Postgres and SQLite, one statement per call.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(CREATE_TABLE_SQL).await?;
        db.execute_unprepared(CREATE_INDEX_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared("DROP INDEX IF EXISTS idx_exchange_rate_cache_fetched;")
            .await?;
        db.execute_unprepared("DROP TABLE IF EXISTS exchange_rate_cache;")
            .await?;
        Ok(())
    }
}

const CREATE_TABLE_SQL: &str = r"
CREATE TABLE IF NOT EXISTS exchange_rate_cache (
    base_currency VARCHAR(3) NOT NULL,
    quote_currency VARCHAR(3) NOT NULL,
    rate_scaled BIGINT NOT NULL,
    fetched_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (base_currency, quote_currency),
    CONSTRAINT chk_rate_positive CHECK (rate_scaled > 0),
    CONSTRAINT chk_distinct_currencies CHECK (base_currency <> quote_currency)
);
";

const CREATE_INDEX_SQL: &str = r"
-- Age scans for operators pruning old pairs
CREATE INDEX IF NOT EXISTS idx_exchange_rate_cache_fetched ON exchange_rate_cache(fetched_at);
";
