//! Durable exchange rate cache repository.
//!
//! Stores one quote per currency pair. Writes keep whichever quote has the
//! later `fetched_at`, so a slow writer can never replace a newer rate.

use chrono::Utc;
use kitty_core::currency::{CurrencyPair, ExchangeRateQuote};
use kitty_core::rates::{DurableRateStore, StoreError};
use kitty_shared::types::{CurrencyCode, ScaledAmount};
use sea_orm::sea_query::{Alias, Expr, OnConflict};
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};
use tracing::{debug, warn};

use crate::entities::exchange_rate_cache;

/// Error types for durable rate cache operations.
#[derive(Debug, thiserror::Error)]
pub enum ExchangeRateCacheError {
    /// A stored row does not describe a valid quote.
    #[error("Corrupt cache row for {base}:{quote}: {reason}")]
    CorruptRow {
        /// Stored base currency.
        base: String,
        /// Stored quote currency.
        quote: String,
        /// What is wrong with the row.
        reason: String,
    },

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<ExchangeRateCacheError> for StoreError {
    fn from(err: ExchangeRateCacheError) -> Self {
        match err {
            ExchangeRateCacheError::CorruptRow { .. } => Self::Corrupt(err.to_string()),
            ExchangeRateCacheError::Database(e) => Self::Backend(e.to_string()),
        }
    }
}

/// Repository for the `exchange_rate_cache` table.
#[derive(Debug, Clone)]
pub struct ExchangeRateCacheRepository {
    db: DatabaseConnection,
}

impl ExchangeRateCacheRepository {
    /// Creates a new exchange rate cache repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds the stored quote for a pair.
    pub async fn find_quote(
        &self,
        pair: &CurrencyPair,
    ) -> Result<Option<ExchangeRateQuote>, ExchangeRateCacheError> {
        let row = exchange_rate_cache::Entity::find_by_id((
            pair.base.as_str().to_string(),
            pair.quote.as_str().to_string(),
        ))
        .one(&self.db)
        .await?;

        row.map(to_quote).transpose()
    }

    /// Inserts the quote, or replaces the stored one if it is older.
    ///
    /// Returns `true` if the row was written and `false` if a quote fetched
    /// at the same time or later was already stored.
    pub async fn upsert_quote(
        &self,
        quote: &ExchangeRateQuote,
    ) -> Result<bool, ExchangeRateCacheError> {
        let fetched_at = quote.fetched_at.fixed_offset();
        let model = exchange_rate_cache::ActiveModel {
            base_currency: Set(quote.base.as_str().to_string()),
            quote_currency: Set(quote.quote.as_str().to_string()),
            rate_scaled: Set(quote.rate.scaled()),
            fetched_at: Set(fetched_at),
            updated_at: Set(Utc::now().fixed_offset()),
        };

        let on_conflict = OnConflict::columns([
            exchange_rate_cache::Column::BaseCurrency,
            exchange_rate_cache::Column::QuoteCurrency,
        ])
        .update_columns([
            exchange_rate_cache::Column::RateScaled,
            exchange_rate_cache::Column::FetchedAt,
            exchange_rate_cache::Column::UpdatedAt,
        ])
        .action_and_where(
            Expr::col((
                exchange_rate_cache::Entity,
                exchange_rate_cache::Column::FetchedAt,
            ))
            .lt(Expr::col((
                Alias::new("excluded"),
                exchange_rate_cache::Column::FetchedAt,
            ))),
        )
        .to_owned();

        let affected = exchange_rate_cache::Entity::insert(model)
            .on_conflict(on_conflict)
            .exec_without_returning(&self.db)
            .await?;

        let written = affected > 0;
        debug!(
            pair = %quote.pair(),
            fetched_at = %quote.fetched_at,
            written,
            "Durable rate upsert"
        );
        Ok(written)
    }

    /// Lists every pair with a stored quote, ordered by base then quote.
    ///
    /// Rows with unparseable currency codes are skipped.
    pub async fn list_pairs(&self) -> Result<Vec<CurrencyPair>, ExchangeRateCacheError> {
        let rows = exchange_rate_cache::Entity::find()
            .order_by_asc(exchange_rate_cache::Column::BaseCurrency)
            .order_by_asc(exchange_rate_cache::Column::QuoteCurrency)
            .all(&self.db)
            .await?;

        let pairs = rows
            .into_iter()
            .filter_map(|row| {
                match CurrencyPair::parse(&row.base_currency, &row.quote_currency) {
                    Ok(pair) => Some(pair),
                    Err(e) => {
                        warn!(
                            base = %row.base_currency,
                            quote = %row.quote_currency,
                            error = %e,
                            "Skipping corrupt cache row"
                        );
                        None
                    }
                }
            })
            .collect();

        Ok(pairs)
    }
}

impl DurableRateStore for ExchangeRateCacheRepository {
    async fn find(&self, pair: &CurrencyPair) -> Result<Option<ExchangeRateQuote>, StoreError> {
        Ok(self.find_quote(pair).await?)
    }

    async fn upsert(&self, quote: &ExchangeRateQuote) -> Result<(), StoreError> {
        self.upsert_quote(quote).await?;
        Ok(())
    }
}

fn to_quote(row: exchange_rate_cache::Model) -> Result<ExchangeRateQuote, ExchangeRateCacheError> {
    let corrupt = |reason: String| ExchangeRateCacheError::CorruptRow {
        base: row.base_currency.clone(),
        quote: row.quote_currency.clone(),
        reason,
    };

    let base = CurrencyCode::parse(&row.base_currency).map_err(|e| corrupt(e.to_string()))?;
    let quote = CurrencyCode::parse(&row.quote_currency).map_err(|e| corrupt(e.to_string()))?;
    let rate = ScaledAmount::try_from_scaled(row.rate_scaled)
        .filter(|rate| !rate.is_negative() && !rate.is_zero())
        .ok_or_else(|| corrupt(format!("rate {} is not positive", row.rate_scaled)))?;

    Ok(ExchangeRateQuote {
        base,
        quote,
        rate,
        fetched_at: row.fetched_at.with_timezone(&Utc),
    })
}
