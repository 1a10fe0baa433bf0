//! Kitty rate cache prefetcher.
//!
//! Loads configuration, builds the tiered exchange rate cache and warms it
//! for the configured pairs, then reports which pairs are fresh, stale or
//! unavailable.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kitty_core::currency::CurrencyPair;
use kitty_core::rates::{CacheOptions, ExchangeRateCache};
use kitty_core::storage::{OpendalKeyValueStore, StorageProvider};
use kitty_db::migration::{Migrator, MigratorTrait};
use kitty_db::{ExchangeRateCacheRepository, connect_with};
use kitty_fx::HttpRateSource;
use kitty_shared::AppConfig;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Warm the exchange rate cache.
#[derive(Debug, Parser)]
#[command(name = "kitty-prefetcher", version)]
struct Args {
    /// Extra pair to warm, as BASE:QUOTE. Repeatable.
    #[arg(short, long = "pair", value_name = "BASE:QUOTE")]
    pairs: Vec<String>,

    /// Also refresh every pair already held by the durable cache.
    #[arg(long)]
    from_store: bool,

    /// Apply pending migrations before warming.
    #[arg(long)]
    migrate: bool,

    /// Exit with an error if any pair ends up without a rate.
    #[arg(long)]
    strict: bool,

    /// Emit JSON log lines.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(args.json);

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = connect_with(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    if args.migrate {
        Migrator::up(&db, None).await.context("Failed to run migrations")?;
        info!("Migrations applied");
    }

    let durable = Arc::new(ExchangeRateCacheRepository::new(db));
    let provider = StorageProvider::from(&config.local_store);
    let local = OpendalKeyValueStore::from_provider(&provider)
        .context("Failed to open local rate store")?;
    info!(provider = provider.name(), "Local rate store ready");
    let source = HttpRateSource::from_config(&config.rates)
        .context("Failed to build live rate source")?;

    let mut requested: Vec<String> = config.rates.prefetch_pairs.clone();
    requested.extend(args.pairs);
    let mut pairs: Vec<(String, String)> =
        requested.iter().filter_map(|raw| parse_pair(raw)).collect();

    if args.from_store {
        let stored = durable
            .list_pairs()
            .await
            .context("Failed to list stored pairs")?;
        pairs.extend(
            stored
                .into_iter()
                .map(|pair| (pair.base.to_string(), pair.quote.to_string())),
        );
    }

    let cache = ExchangeRateCache::new(
        local,
        durable,
        source,
        CacheOptions::from(&config.rates),
    );

    let handle = cache.prefetch(pairs);
    if handle.is_empty() {
        warn!("No currency pairs to prefetch");
        return Ok(());
    }

    let summary = handle.wait().await;
    info!(
        warmed = summary.warmed.len(),
        stale = summary.stale.len(),
        unavailable = summary.unavailable.len(),
        "Prefetch finished"
    );
    for pair in &summary.stale {
        warn!(pair = %pair, "Serving stale rate");
    }
    for pair in &summary.unavailable {
        warn!(pair = %pair, "No rate available");
    }

    if args.strict && !summary.unavailable.is_empty() {
        anyhow::bail!("{} pair(s) have no rate", summary.unavailable.len());
    }

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kitty=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn parse_pair(raw: &str) -> Option<(String, String)> {
    match CurrencyPair::parse_key(raw) {
        Ok(pair) => Some((pair.base.to_string(), pair.quote.to_string())),
        Err(err) => {
            warn!(pair = raw, error = %err, "Ignoring malformed pair, expected BASE:QUOTE");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair_uses_key_form() {
        assert_eq!(parse_pair("usd:eur"), Some(("USD".into(), "EUR".into())));
        assert_eq!(parse_pair(" GBP : JPY "), Some(("GBP".into(), "JPY".into())));
        assert_eq!(parse_pair("USDEUR"), None);
        assert_eq!(parse_pair("USD:EUR:GBP"), None);
        assert_eq!(parse_pair("US:EUR"), None);
    }

    #[test]
    fn test_args_collect_repeated_pairs() {
        let args = Args::try_parse_from([
            "kitty-prefetcher",
            "--pair",
            "USD:EUR",
            "-p",
            "GBP:USD",
            "--from-store",
            "--strict",
        ])
        .unwrap();

        assert_eq!(args.pairs, vec!["USD:EUR", "GBP:USD"]);
        assert!(args.from_store);
        assert!(args.strict);
        assert!(!args.migrate);
    }
}
