//! CoinGecko API client
//!
//! This module issues plain JSON GET requests against the CoinGecko v3 API and
//! maps non-2xx responses to `UpstreamError`. Every call goes to the network:
//! caching is layered on top by the service module.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::{Chart, Coin, MarketRow, StatusUpdate};

/// Base URL for the CoinGecko public API
pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Header carrying the CoinGecko demo-plan API key
const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// Maximum number of characters of an error body kept in `UpstreamError::Status`
const BODY_EXCERPT_CHARS: usize = 200;

/// Errors that can occur when talking to the upstream API
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Upstream answered with a non-2xx status
    #[error("CoinGecko error {status}: {body_excerpt}")]
    Status { status: u16, body_excerpt: String },

    /// HTTP request failed before a response was received
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not the expected JSON shape
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot have path segments appended (e.g., `mailto:`)
    #[error("Base URL cannot be used for API paths: {0}")]
    InvalidBaseUrl(String),
}

/// Connection settings for the upstream API
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// Base URL that API paths are appended to
    pub base_url: Url,
    /// Optional API key, sent on every request when present
    pub api_key: Option<String>,
}

impl UpstreamConfig {
    /// Creates a config for the given base URL without an API key
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            api_key: None,
        }
    }

    /// Sets the API key; blank keys are treated as absent
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }
}

/// Parameters for one page of the market listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketsRequest {
    pub page: u32,
    pub per_page: u32,
    pub category: Option<String>,
}

/// Source of upstream market data
///
/// The cached-fetch layer depends on this trait rather than on the HTTP client so
/// that a different provider, or a fake in tests, can stand in for CoinGecko.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetches detail and market data for one coin
    async fn coin(&self, id: &str) -> Result<Coin, UpstreamError>;

    /// Fetches the USD price history of a coin over the last `days` days
    async fn market_chart(&self, id: &str, days: u32) -> Result<Chart, UpstreamError>;

    /// Fetches the most recent status updates for a coin
    async fn status_updates(&self, id: &str) -> Result<Vec<StatusUpdate>, UpstreamError>;

    /// Fetches one page of coins ordered by market cap
    async fn markets(&self, request: &MarketsRequest) -> Result<Vec<MarketRow>, UpstreamError>;
}

#[derive(Debug, Deserialize)]
struct StatusUpdatesResponse {
    #[serde(default)]
    status_updates: Option<Vec<StatusUpdate>>,
}

/// Client for fetching market data from the CoinGecko API
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    http_client: Client,
    config: UpstreamConfig,
}

impl CoinGeckoClient {
    /// Creates a new client with the given upstream settings
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            http_client: Client::new(),
            config,
        }
    }

    /// Creates a new client with a custom HTTP client
    pub fn with_client(http_client: Client, config: UpstreamConfig) -> Self {
        Self {
            http_client,
            config,
        }
    }

    /// Builds the URL for an API path given as unencoded segments
    ///
    /// Each segment is percent-encoded, so ids containing `/` or spaces cannot
    /// escape their path position.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| UpstreamError::InvalidBaseUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Issues a GET request and decodes the JSON response
    ///
    /// # Arguments
    /// * `segments` - Path segments appended to the base URL
    /// * `query` - Query parameters; pairs with a `None` value are skipped
    ///
    /// # Returns
    /// * `Ok(T)` - The decoded response body
    /// * `Err(UpstreamError::Status)` - If the response status is not 2xx
    /// * `Err(UpstreamError)` - If the request or decoding fails
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, Option<String>)],
    ) -> Result<T, UpstreamError> {
        let url = self.endpoint(segments)?;
        let params: Vec<(&str, &str)> = query
            .iter()
            .filter_map(|(name, value)| value.as_deref().map(|v| (*name, v)))
            .collect();

        let mut request = self
            .http_client
            .get(url)
            .header(ACCEPT, "application/json")
            .query(&params);
        if let Some(ref key) = self.config.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            // An unreadable error body still reports the status
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                body_excerpt: excerpt(&body),
            });
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Truncates an error body to the first `BODY_EXCERPT_CHARS` characters
fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

fn flag(value: bool) -> Option<String> {
    Some(value.to_string())
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    async fn coin(&self, id: &str) -> Result<Coin, UpstreamError> {
        self.get_json(
            &["coins", id],
            &[
                ("localization", flag(false)),
                ("tickers", flag(false)),
                ("market_data", flag(true)),
                ("community_data", flag(false)),
                ("developer_data", flag(false)),
                ("sparkline", flag(false)),
            ],
        )
        .await
    }

    async fn market_chart(&self, id: &str, days: u32) -> Result<Chart, UpstreamError> {
        self.get_json(
            &["coins", id, "market_chart"],
            &[
                ("vs_currency", Some("usd".to_string())),
                ("days", Some(days.to_string())),
            ],
        )
        .await
    }

    async fn status_updates(&self, id: &str) -> Result<Vec<StatusUpdate>, UpstreamError> {
        let response: StatusUpdatesResponse = self
            .get_json(
                &["coins", id, "status_updates"],
                &[
                    ("per_page", Some("10".to_string())),
                    ("page", Some("1".to_string())),
                ],
            )
            .await?;
        Ok(response.status_updates.unwrap_or_default())
    }

    async fn markets(&self, request: &MarketsRequest) -> Result<Vec<MarketRow>, UpstreamError> {
        self.get_json(
            &["coins", "markets"],
            &[
                ("vs_currency", Some("usd".to_string())),
                ("order", Some("market_cap_desc".to_string())),
                ("per_page", Some(request.per_page.to_string())),
                ("page", Some(request.page.to_string())),
                ("category", request.category.clone()),
                ("sparkline", flag(false)),
                ("price_change_percentage", Some("1h,24h,7d".to_string())),
            ],
        )
        .await
    }
}
