//! reqwest-backed live rate source.

use std::sync::Arc;
use std::time::Duration;

use kitty_core::currency::{CurrencyPair, ExchangeRateQuote};
use kitty_core::rates::{Clock, LiveRateSource, SourceError, SystemClock};
use kitty_shared::config::RatesConfig;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::dto::LatestRatesResponse;

/// HTTP client for a `/latest` exchange rate endpoint.
///
/// One request per fetch, no retries. A timeout or a non-success status is a
/// plain failure; the cache decides whether a stale quote is served instead.
#[derive(Clone)]
pub struct HttpRateSource {
    http: HttpClient,
    base_url: String,
    api_key: Option<String>,
    clock: Arc<dyn Clock>,
}

impl HttpRateSource {
    /// Creates a source with the given request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Builds a source from the rate settings.
    pub fn from_config(config: &RatesConfig) -> Result<Self, SourceError> {
        let source = Self::new(config.source_url.clone(), config.request_timeout())?;
        Ok(match &config.api_key {
            Some(key) => source.with_api_key(key.clone()),
            None => source,
        })
    }

    /// Sends `key` as a bearer token on every request.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Clock used to stamp quotes whose response carries no timestamp.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn request(&self, pair: &CurrencyPair) -> Result<ExchangeRateQuote, SourceError> {
        let url = format!("{}/latest", self.base_url);
        debug!(pair = %pair, url = %url, "Requesting live rate");

        let mut request = self
            .http
            .get(&url)
            .query(&[("base", pair.base.as_str()), ("symbols", pair.quote.as_str())]);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        let body: LatestRatesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout
            } else {
                SourceError::InvalidResponse(e.to_string())
            }
        })?;

        body.into_quote(pair, self.clock.now())
    }
}

impl LiveRateSource for HttpRateSource {
    async fn fetch(&self, pair: &CurrencyPair) -> Result<ExchangeRateQuote, SourceError> {
        self.request(pair).await
    }
}

impl std::fmt::Debug for HttpRateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRateSource")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

fn map_transport(err: reqwest::Error) -> SourceError {
    if err.is_timeout() {
        SourceError::Timeout
    } else {
        SourceError::Transport(err.to_string())
    }
}
