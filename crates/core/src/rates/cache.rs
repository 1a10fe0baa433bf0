//! Tiered exchange rate cache.

use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use kitty_shared::config::RatesConfig;
use moka::sync::Cache;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::error::{CacheError, CacheTier, RateError, StoreError};
use super::ports::{Clock, DurableRateStore, KeyValueStore, LiveRateSource, RateLookup, SystemClock};
use super::state::{self, Settlement, TierOutcome};
use crate::currency::{CurrencyPair, ExchangeRateQuote};

/// Default freshness window: 12 hours.
const DEFAULT_FRESHNESS_SECS: i64 = 12 * 60 * 60;

/// Default number of pairs held in memory.
const DEFAULT_MEMO_CAPACITY: u64 = 1_000;

type FetchResult = Result<ExchangeRateQuote, RateError>;

/// Key of a pair in the local key-value tier.
#[must_use]
pub fn local_key(pair: &CurrencyPair) -> String {
    format!("exchange_rate:{}", pair.key())
}

/// Cache tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Maximum age served without a refresh. The boundary is still fresh.
    pub freshness_window: TimeDelta,
    /// Maximum number of pairs in the memo tier.
    pub memo_capacity: u64,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            freshness_window: TimeDelta::seconds(DEFAULT_FRESHNESS_SECS),
            memo_capacity: DEFAULT_MEMO_CAPACITY,
        }
    }
}

impl From<&RatesConfig> for CacheOptions {
    fn from(config: &RatesConfig) -> Self {
        Self {
            freshness_window: config.freshness_window(),
            memo_capacity: config.memo_capacity,
        }
    }
}

struct InflightFetch {
    id: u64,
    fetch: Shared<BoxFuture<'static, FetchResult>>,
}

struct CacheInner<L, D, S> {
    local: L,
    durable: D,
    source: S,
    clock: Arc<dyn Clock>,
    window: TimeDelta,
    memo: Cache<CurrencyPair, ExchangeRateQuote>,
    inflight: DashMap<CurrencyPair, InflightFetch>,
    generation: AtomicU64,
}

/// Exchange rate cache: memo, local store, durable store, then live source.
///
/// Cloning is cheap and every clone shares the memo tier and the inflight
/// registry. At most one live fetch per pair runs at a time; concurrent
/// callers for the same pair join it and receive the same result.
pub struct ExchangeRateCache<L, D, S> {
    inner: Arc<CacheInner<L, D, S>>,
}

impl<L, D, S> Clone for ExchangeRateCache<L, D, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<L, D, S> ExchangeRateCache<L, D, S>
where
    L: KeyValueStore,
    D: DurableRateStore,
    S: LiveRateSource,
{
    /// Creates a cache on the wall clock.
    #[must_use]
    pub fn new(local: L, durable: D, source: S, options: CacheOptions) -> Self {
        Self::with_clock(local, durable, source, options, Arc::new(SystemClock))
    }

    /// Creates a cache with an explicit clock.
    #[must_use]
    pub fn with_clock(
        local: L,
        durable: D,
        source: S,
        options: CacheOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                local,
                durable,
                source,
                clock,
                window: options.freshness_window,
                memo: Cache::builder().max_capacity(options.memo_capacity).build(),
                inflight: DashMap::new(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Resolves the rate for `pair`.
    ///
    /// Same-currency pairs return rate 1.0 stamped now without touching any
    /// tier. Otherwise the first fresh tier wins; if none is fresh the live
    /// source is asked, and a failed fetch falls back to the freshest stale
    /// quote any tier held.
    ///
    /// # Errors
    ///
    /// Returns [`RateError::Unavailable`] when the source failed and no tier
    /// held a quote for the pair.
    pub async fn get_rate(&self, pair: &CurrencyPair) -> FetchResult {
        let now = self.inner.clock.now();
        if pair.is_same_currency() {
            return Ok(ExchangeRateQuote::identity(&pair.base, now));
        }

        let memo = self.inner.memo.get(pair);
        let stale = match state::observe(pair, None, memo, now, self.inner.window) {
            TierOutcome::Fresh(quote) => {
                debug!(pair = %pair, tier = %CacheTier::Memo, "Exchange rate cache hit");
                return Ok(quote);
            }
            TierOutcome::Miss { stale } => stale,
        };

        self.join_or_start(pair, stale, now).await
    }

    /// Warms the cache for each distinct pair without blocking the caller.
    ///
    /// Codes are case-normalized; invalid codes and same-currency pairs are
    /// skipped. Dropping the returned handle leaves the fetches running.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn prefetch<I, B, Q>(&self, pairs: I) -> PrefetchHandle
    where
        I: IntoIterator<Item = (B, Q)>,
        B: AsRef<str>,
        Q: AsRef<str>,
    {
        let mut distinct = BTreeSet::new();
        for (base, quote) in pairs {
            let (base, quote) = (base.as_ref(), quote.as_ref());
            match CurrencyPair::parse(base, quote) {
                Ok(pair) if pair.is_same_currency() => {
                    debug!(pair = %pair, "Skipping same-currency prefetch");
                }
                Ok(pair) => {
                    distinct.insert(pair);
                }
                Err(err) => warn!(base, quote, error = %err, "Skipping invalid prefetch pair"),
            }
        }

        info!(pairs = distinct.len(), "Prefetching exchange rates");
        let tasks = distinct
            .into_iter()
            .map(|pair| {
                let cache = self.clone();
                let target = pair.clone();
                let task = tokio::spawn(async move { cache.get_rate(&target).await });
                (pair, task)
            })
            .collect();

        PrefetchHandle {
            tasks,
            clock: Arc::clone(&self.inner.clock),
            window: self.inner.window,
        }
    }

    /// Clears the memo tier and the inflight registry.
    ///
    /// Persistent tiers are untouched. Fetches already running complete
    /// normally but no longer deduplicate new callers.
    pub fn reset(&self) {
        self.inner.inflight.clear();
        self.inner.memo.invalidate_all();
    }

    /// Number of pairs with a live fetch in progress.
    #[must_use]
    pub fn inflight_count(&self) -> usize {
        self.inner.inflight.len()
    }

    fn join_or_start(
        &self,
        pair: &CurrencyPair,
        stale: Option<ExchangeRateQuote>,
        now: DateTime<Utc>,
    ) -> Shared<BoxFuture<'static, FetchResult>> {
        match self.inner.inflight.entry(pair.clone()) {
            Entry::Occupied(entry) => {
                debug!(pair = %pair, "Joining inflight exchange rate fetch");
                entry.get().fetch.clone()
            }
            Entry::Vacant(entry) => {
                let id = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                let inner = Arc::clone(&self.inner);
                let pair = pair.clone();
                let fetch = async move {
                    let fallback = stale.clone();
                    let outcome = AssertUnwindSafe(inner.resolve(&pair, stale, now))
                        .catch_unwind()
                        .await;
                    inner.inflight.remove_if(&pair, |_, running| running.id == id);
                    outcome.unwrap_or_else(|_| {
                        error!(
                            pair = %pair,
                            has_stale = fallback.is_some(),
                            "Exchange rate resolution panicked"
                        );
                        fallback.ok_or_else(|| RateError::unavailable(&pair))
                    })
                }
                .boxed()
                .shared();
                entry.insert(InflightFetch {
                    id,
                    fetch: fetch.clone(),
                });
                fetch
            }
        }
    }
}

impl<L, D, S> CacheInner<L, D, S>
where
    L: KeyValueStore,
    D: DurableRateStore,
    S: LiveRateSource,
{
    async fn resolve(
        &self,
        pair: &CurrencyPair,
        stale: Option<ExchangeRateQuote>,
        now: DateTime<Utc>,
    ) -> FetchResult {
        let local = self.read_local(pair).await;
        let stale = match state::observe(pair, stale, local, now, self.window) {
            TierOutcome::Fresh(quote) => {
                debug!(pair = %pair, tier = %CacheTier::Local, "Exchange rate cache hit");
                self.memo.insert(pair.clone(), quote.clone());
                return Ok(quote);
            }
            TierOutcome::Miss { stale } => stale,
        };

        let durable = self.read_durable(pair).await;
        let stale = match state::observe(pair, stale, durable, now, self.window) {
            TierOutcome::Fresh(quote) => {
                debug!(pair = %pair, tier = %CacheTier::Durable, "Exchange rate cache hit");
                self.write_local(&quote).await;
                self.memo.insert(pair.clone(), quote.clone());
                return Ok(quote);
            }
            TierOutcome::Miss { stale } => stale,
        };

        info!(pair = %pair, has_stale = stale.is_some(), "Fetching exchange rate from live source");
        let fetched = self.source.fetch(pair).await;

        match state::settle(pair, fetched, stale) {
            Settlement::Fetched(quote) => {
                self.write_durable(&quote).await;
                self.write_local(&quote).await;
                self.memo.insert(pair.clone(), quote.clone());
                info!(pair = %pair, rate = %quote.rate, "Exchange rate refreshed");
                Ok(quote)
            }
            Settlement::Stale { quote, cause } => {
                warn!(
                    pair = %pair,
                    error = %cause,
                    fetched_at = %quote.fetched_at,
                    "Live rate fetch failed, serving stale rate"
                );
                Ok(quote)
            }
            Settlement::Unavailable(cause) => {
                warn!(
                    pair = %pair,
                    error = %cause,
                    "Live rate fetch failed and no cached rate exists"
                );
                Err(RateError::unavailable(pair))
            }
        }
    }

    async fn read_local(&self, pair: &CurrencyPair) -> Option<ExchangeRateQuote> {
        let read = match self.local.get(&local_key(pair)).await {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StoreError::Corrupt(e.to_string())),
            Ok(None) => Ok(None),
            Err(err) => Err(err),
        };
        read.unwrap_or_else(|source| {
            log_cache_error(&CacheError::ReadFailed {
                tier: CacheTier::Local,
                pair: pair.clone(),
                source,
            });
            None
        })
    }

    async fn read_durable(&self, pair: &CurrencyPair) -> Option<ExchangeRateQuote> {
        self.durable.find(pair).await.unwrap_or_else(|source| {
            log_cache_error(&CacheError::ReadFailed {
                tier: CacheTier::Durable,
                pair: pair.clone(),
                source,
            });
            None
        })
    }

    async fn write_local(&self, quote: &ExchangeRateQuote) {
        let pair = quote.pair();
        let written = match serde_json::to_string(quote) {
            Ok(raw) => self.local.set(&local_key(&pair), raw).await,
            Err(e) => Err(StoreError::Corrupt(e.to_string())),
        };
        if let Err(source) = written {
            log_cache_error(&CacheError::WriteFailed {
                tier: CacheTier::Local,
                pair,
                source,
            });
        }
    }

    async fn write_durable(&self, quote: &ExchangeRateQuote) {
        if let Err(source) = self.durable.upsert(quote).await {
            log_cache_error(&CacheError::WriteFailed {
                tier: CacheTier::Durable,
                pair: quote.pair(),
                source,
            });
        }
    }
}

fn log_cache_error(err: &CacheError) {
    match err {
        CacheError::ReadFailed { tier, pair, .. } => {
            warn!(tier = %tier, pair = %pair, error = %err, "CacheReadFailed");
        }
        CacheError::WriteFailed { tier, pair, .. } => {
            warn!(tier = %tier, pair = %pair, error = %err, "CacheWriteFailed");
        }
    }
}

impl<L, D, S> RateLookup for ExchangeRateCache<L, D, S>
where
    L: KeyValueStore,
    D: DurableRateStore,
    S: LiveRateSource,
{
    async fn rate(&self, pair: &CurrencyPair) -> FetchResult {
        self.get_rate(pair).await
    }
}

/// Outcome of a prefetch run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    /// Pairs now holding a fresh quote.
    pub warmed: Vec<CurrencyPair>,
    /// Pairs served from a stale quote because the source failed.
    pub stale: Vec<CurrencyPair>,
    /// Pairs with no quote at all.
    pub unavailable: Vec<CurrencyPair>,
}

/// Running prefetch tasks.
///
/// Dropping the handle detaches the tasks; they still complete and fill
/// the cache.
pub struct PrefetchHandle {
    tasks: Vec<(CurrencyPair, JoinHandle<FetchResult>)>,
    clock: Arc<dyn Clock>,
    window: TimeDelta,
}

impl PrefetchHandle {
    /// Pairs being fetched, sorted.
    #[must_use]
    pub fn pairs(&self) -> Vec<CurrencyPair> {
        self.tasks.iter().map(|(pair, _)| pair.clone()).collect()
    }

    /// Number of distinct pairs being fetched.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing was worth fetching.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every fetch and summarizes the outcome.
    pub async fn wait(self) -> PrefetchSummary {
        let mut summary = PrefetchSummary::default();
        for (pair, task) in self.tasks {
            match task.await {
                Ok(Ok(quote)) if quote.is_fresh(self.clock.now(), self.window) => {
                    summary.warmed.push(pair);
                }
                Ok(Ok(_)) => summary.stale.push(pair),
                Ok(Err(_)) => summary.unavailable.push(pair),
                Err(err) => {
                    warn!(pair = %pair, error = %err, "Prefetch task failed");
                    summary.unavailable.push(pair);
                }
            }
        }
        summary
    }
}
