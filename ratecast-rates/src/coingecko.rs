//! CoinGecko rate source.
//!
//! Reads the BTC/USD spot price from the public `simple/price` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use url::Url;

use ratecast_core::constants::DEFAULT_COINGECKO_URL;
use ratecast_core::error::{RatecastError, Result};
use ratecast_core::traits::RateSource;

/// Rate source configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RatesConfig {
    /// API root, e.g. `https://api.coingecko.com` or a mock server URI
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_COINGECKO_URL.into(),
            timeout_seconds: 10,
        }
    }
}

impl RatesConfig {
    /// Creates config pointing at a different API root.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

/// HTTP client for the CoinGecko price API.
pub struct CoinGeckoClient {
    endpoint: Url,
    http_client: reqwest::Client,
}

impl CoinGeckoClient {
    /// Creates a client against the public CoinGecko API.
    pub fn new() -> Result<Self> {
        Self::with_config(RatesConfig::default())
    }

    /// Creates a client with the given config.
    ///
    /// # Errors
    /// [`RatecastError::ConfigError`] if the base URL does not parse or the
    /// HTTP client cannot be built.
    pub fn with_config(config: RatesConfig) -> Result<Self> {
        let endpoint = price_endpoint(&config.base_url)?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| RatecastError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            endpoint,
            http_client,
        })
    }

    /// Returns the fully-qualified price URL this client queries.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RateSource for CoinGeckoClient {
    #[instrument(skip(self))]
    async fn fetch_rate(&self) -> Result<f64> {
        let response = self
            .http_client
            .get(self.endpoint.clone())
            .send()
            .await
            .map_err(|e| RatecastError::RateSourceError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatecastError::RateSourceError(format!(
                "Failed to fetch exchange rates, with an HTTP code of {}",
                status
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RatecastError::RateSourceError(e.to_string()))?;
        trace!(body = %String::from_utf8_lossy(&body), "CoinGecko /simple/price response body");

        let parsed: SimplePriceResponse = serde_json::from_slice(&body)
            .map_err(|e| RatecastError::RateSourceError(format!("Malformed price response: {}", e)))?;

        debug!(rate = parsed.bitcoin.usd, "Fetched BTC/USD rate");
        Ok(parsed.bitcoin.usd)
    }
}

fn price_endpoint(base_url: &str) -> Result<Url> {
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    let mut url = Url::parse(&base)
        .and_then(|base| base.join("api/v3/simple/price"))
        .map_err(|e| RatecastError::ConfigError(format!("Invalid rates base URL '{}': {}", base_url, e)))?;

    url.query_pairs_mut()
        .append_pair("ids", "bitcoin")
        .append_pair("vs_currencies", "usd");

    Ok(url)
}

#[derive(Debug, Deserialize)]
struct SimplePriceResponse {
    bitcoin: CurrencyPrices,
}

#[derive(Debug, Deserialize)]
struct CurrencyPrices {
    usd: f64,
}
