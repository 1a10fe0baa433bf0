//! Integration tests for ExchangeRateCacheRepository.
//!
//! Runs against a throwaway SQLite file with the real migrations applied.

use chrono::{DateTime, TimeZone, Utc};
use kitty_core::currency::{CurrencyPair, ExchangeRateQuote};
use kitty_core::rates::{DurableRateStore, StoreError};
use kitty_db::entities::exchange_rate_cache;
use kitty_db::migration::{Migrator, MigratorTrait};
use kitty_db::{ExchangeRateCacheRepository, connect};
use kitty_shared::types::ScaledAmount;
use sea_orm::{DatabaseConnection, EntityTrait, Set};
use tempfile::TempDir;

/// Fresh migrated database. The directory must outlive the connection.
async fn setup() -> (TempDir, DatabaseConnection) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("kitty.db").display());
    let db = connect(&url).await.expect("Failed to connect to database");
    Migrator::up(&db, None).await.expect("Failed to run migrations");
    (dir, db)
}

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, hour, 0, 0).unwrap()
}

fn pair(base: &str, quote: &str) -> CurrencyPair {
    CurrencyPair::parse(base, quote).unwrap()
}

fn quote(base: &str, quote_code: &str, raw: i64, fetched_at: DateTime<Utc>) -> ExchangeRateQuote {
    ExchangeRateQuote::new(&pair(base, quote_code), ScaledAmount::from_scaled(raw), fetched_at)
}

// ============================================================================
// Migrations
// ============================================================================
#[tokio::test]
async fn test_migrations_roll_back_and_reapply() {
    let (_dir, db) = setup().await;

    Migrator::down(&db, None).await.expect("Failed to roll back");
    Migrator::up(&db, None).await.expect("Failed to reapply");

    let rows = exchange_rate_cache::Entity::find().all(&db).await.unwrap();
    assert!(rows.is_empty());
}

// ============================================================================
// Find and upsert
// ============================================================================
#[tokio::test]
async fn test_find_missing_pair_returns_none() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    let found = repo.find_quote(&pair("USD", "EUR")).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_upsert_then_find_round_trips_exact_rate() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);
    let stored = quote("EUR", "USD", 10_850, at(8));

    assert!(repo.upsert_quote(&stored).await.unwrap());

    let found = repo.find_quote(&pair("EUR", "USD")).await.unwrap();
    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn test_newer_quote_replaces_older() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    repo.upsert_quote(&quote("EUR", "USD", 10_850, at(8))).await.unwrap();
    let written = repo.upsert_quote(&quote("EUR", "USD", 10_900, at(9))).await.unwrap();

    assert!(written);
    let found = repo.find_quote(&pair("EUR", "USD")).await.unwrap().unwrap();
    assert_eq!(found.rate, ScaledAmount::from_scaled(10_900));
    assert_eq!(found.fetched_at, at(9));
}

#[tokio::test]
async fn test_older_quote_never_replaces_newer() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    repo.upsert_quote(&quote("EUR", "USD", 10_900, at(9))).await.unwrap();
    let written = repo.upsert_quote(&quote("EUR", "USD", 10_850, at(8))).await.unwrap();

    assert!(!written);
    let found = repo.find_quote(&pair("EUR", "USD")).await.unwrap().unwrap();
    assert_eq!(found.rate, ScaledAmount::from_scaled(10_900));
    assert_eq!(found.fetched_at, at(9));
}

#[tokio::test]
async fn test_same_timestamp_keeps_existing_row() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    repo.upsert_quote(&quote("EUR", "USD", 10_850, at(8))).await.unwrap();
    let written = repo.upsert_quote(&quote("EUR", "USD", 11_000, at(8))).await.unwrap();

    assert!(!written);
    let found = repo.find_quote(&pair("EUR", "USD")).await.unwrap().unwrap();
    assert_eq!(found.rate, ScaledAmount::from_scaled(10_850));
}

#[tokio::test]
async fn test_pairs_are_directional() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    repo.upsert_quote(&quote("EUR", "USD", 10_850, at(8))).await.unwrap();

    assert!(repo.find_quote(&pair("USD", "EUR")).await.unwrap().is_none());
}

// ============================================================================
// Listing
// ============================================================================
#[tokio::test]
async fn test_list_pairs_is_sorted() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);

    repo.upsert_quote(&quote("USD", "JPY", 1_500_000, at(8))).await.unwrap();
    repo.upsert_quote(&quote("EUR", "USD", 10_850, at(8))).await.unwrap();
    repo.upsert_quote(&quote("EUR", "GBP", 8_600, at(8))).await.unwrap();

    let pairs = repo.list_pairs().await.unwrap();
    assert_eq!(
        pairs,
        vec![pair("EUR", "GBP"), pair("EUR", "USD"), pair("USD", "JPY")]
    );
}

#[tokio::test]
async fn test_list_pairs_skips_corrupt_rows() {
    let (_dir, db) = setup().await;

    let row = exchange_rate_cache::ActiveModel {
        base_currency: Set("U5D".to_string()),
        quote_currency: Set("EUR".to_string()),
        rate_scaled: Set(9_200),
        fetched_at: Set(at(8).fixed_offset()),
        updated_at: Set(at(8).fixed_offset()),
    };
    exchange_rate_cache::Entity::insert(row)
        .exec_without_returning(&db)
        .await
        .unwrap();

    let repo = ExchangeRateCacheRepository::new(db);
    repo.upsert_quote(&quote("GBP", "EUR", 11_700, at(8))).await.unwrap();

    assert_eq!(repo.list_pairs().await.unwrap(), vec![pair("GBP", "EUR")]);
}

// ============================================================================
// Durable tier port
// ============================================================================
#[tokio::test]
async fn test_durable_rate_store_port() {
    let (_dir, db) = setup().await;
    let repo = ExchangeRateCacheRepository::new(db);
    let stored = quote("GBP", "USD", 12_700, at(10));

    DurableRateStore::upsert(&repo, &stored).await.unwrap();
    DurableRateStore::upsert(&repo, &quote("GBP", "USD", 12_500, at(7)))
        .await
        .unwrap();

    let found = DurableRateStore::find(&repo, &pair("GBP", "USD")).await.unwrap();
    assert_eq!(found, Some(stored));
}

#[tokio::test]
async fn test_out_of_range_rate_reads_as_corrupt() {
    let (_dir, db) = setup().await;

    let row = exchange_rate_cache::ActiveModel {
        base_currency: Set("CHF".to_string()),
        quote_currency: Set("EUR".to_string()),
        rate_scaled: Set(i64::MAX),
        fetched_at: Set(at(8).fixed_offset()),
        updated_at: Set(at(8).fixed_offset()),
    };
    exchange_rate_cache::Entity::insert(row)
        .exec_without_returning(&db)
        .await
        .unwrap();

    let repo = ExchangeRateCacheRepository::new(db);
    let err = DurableRateStore::find(&repo, &pair("CHF", "EUR")).await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt(_)));
}
