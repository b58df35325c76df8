//! Cached-fetch service over the upstream market data source
//!
//! Every resource goes through the same policy:
//! - a cache entry younger than the resource TTL is returned as-is (`Hit`)
//! - otherwise the upstream is called, and a success is stored and returned (`Miss`)
//! - an upstream failure falls back to the previous entry of any age, marked
//!   stale with `fetchedAt` set to the attempt time (`Stale`)
//! - an upstream failure with nothing cached is a `ServiceError`
//!
//! A failed fetch never overwrites a previously stored payload.

pub mod keys;
pub mod params;

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::future::try_join_all;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::cache::{self, CacheEntry, CacheStore};
use crate::data::{
    merge_by_rank, select_movers, Chart, Coin, MarketRow, MarketSource, MarketsRequest,
    MoversMode, StatusUpdate, UpstreamError,
};

/// Pages fetched for the aggregated top-N listing
pub const TOP_MARKET_PAGES: [u32; 4] = [1, 2, 3, 4];

/// Rows per page for the aggregated top-N listing
pub const TOP_MARKET_PER_PAGE: u32 = 250;

/// Kinds of cached upstream resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Coin,
    Chart,
    StatusUpdates,
    MarketPage,
    TopMarkets,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Coin => "coin",
            ResourceKind::Chart => "chart",
            ResourceKind::StatusUpdates => "status_updates",
            ResourceKind::MarketPage => "market_page",
            ResourceKind::TopMarkets => "top_markets",
        }
    }

    /// Message shown to callers when nothing can be served
    pub fn unavailable_message(&self) -> &'static str {
        match self {
            ResourceKind::Coin => "Coin data temporarily unavailable.",
            ResourceKind::Chart => "Chart data temporarily unavailable.",
            ResourceKind::StatusUpdates => "Status updates unavailable.",
            ResourceKind::MarketPage | ResourceKind::TopMarkets => {
                "Market data temporarily unavailable."
            }
        }
    }
}

/// Freshness window per resource kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub coin: Duration,
    pub chart: Duration,
    pub status_updates: Duration,
    pub market_page: Duration,
    pub top_markets: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            coin: Duration::seconds(30),
            chart: Duration::seconds(60),
            status_updates: Duration::minutes(10),
            market_page: Duration::seconds(20),
            top_markets: Duration::seconds(30),
        }
    }
}

impl CacheTtls {
    /// Uses the same TTL for every resource kind
    pub fn uniform(ttl: Duration) -> Self {
        Self {
            coin: ttl,
            chart: ttl,
            status_updates: ttl,
            market_page: ttl,
            top_markets: ttl,
        }
    }

    pub fn for_resource(&self, resource: ResourceKind) -> Duration {
        match resource {
            ResourceKind::Coin => self.coin,
            ResourceKind::Chart => self.chart,
            ResourceKind::StatusUpdates => self.status_updates,
            ResourceKind::MarketPage => self.market_page,
            ResourceKind::TopMarkets => self.top_markets,
        }
    }
}

/// How a response was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a fresh cache entry
    Hit,
    /// Fetched from upstream and stored
    Miss,
    /// Upstream failed; served from an older cache entry
    Stale,
}

impl CacheStatus {
    /// Value of the `x-cache` response header
    pub fn header_value(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
        }
    }
}

/// Response body for a cached resource
///
/// `meta` holds route-specific fields and is flattened into the JSON object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload<T, M> {
    pub data: T,
    #[serde(flatten)]
    pub meta: M,
    /// Time of the last upstream attempt that produced or revalidated this payload
    pub fetched_at: DateTime<Utc>,
    pub stale: bool,
}

/// No route-specific fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NoMeta {}

/// Paging fields echoed back by the market page route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub page: u32,
    pub per_page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Upstream pages merged into the aggregated listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcePages {
    #[serde(rename = "sourcePages")]
    pub source_pages: Vec<u32>,
}

/// Selection echoed back by the movers route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoversMeta {
    pub mode: MoversMode,
    pub limit: usize,
}

/// A payload together with how it was produced
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<P> {
    pub payload: P,
    pub status: CacheStatus,
}

pub type CoinPayload = Payload<Coin, NoMeta>;
pub type ChartPayload = Payload<Chart, NoMeta>;
pub type StatusUpdatesPayload = Payload<Vec<StatusUpdate>, NoMeta>;
pub type MarketPagePayload = Payload<Vec<MarketRow>, PageMeta>;
pub type TopMarketsPayload = Payload<Vec<MarketRow>, SourcePages>;
pub type MoversPayload = Payload<Vec<MarketRow>, MoversMeta>;

/// Errors surfaced to callers of the service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Upstream failed and there is no cached payload to fall back to
    #[error("{}", .resource.unavailable_message())]
    NoCachedFallback {
        resource: ResourceKind,
        #[source]
        source: UpstreamError,
    },
}

impl ServiceError {
    pub fn resource(&self) -> ResourceKind {
        match self {
            ServiceError::NoCachedFallback { resource, .. } => *resource,
        }
    }
}

/// Market data service combining an upstream source with a TTL cache
#[derive(Clone)]
pub struct MarketService {
    source: Arc<dyn MarketSource>,
    cache: Arc<dyn CacheStore>,
    ttls: CacheTtls,
}

impl MarketService {
    /// Creates a service with the default per-resource TTLs
    pub fn new(source: Arc<dyn MarketSource>, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            source,
            cache,
            ttls: CacheTtls::default(),
        }
    }

    /// Replaces the per-resource TTLs
    pub fn with_ttls(mut self, ttls: CacheTtls) -> Self {
        self.ttls = ttls;
        self
    }

    pub fn ttls(&self) -> &CacheTtls {
        &self.ttls
    }

    /// Fetches detail for one coin (30s TTL by default)
    pub async fn coin_detail(&self, id: &str) -> Result<Cached<CoinPayload>, ServiceError> {
        self.fetch_cached(ResourceKind::Coin, &keys::coin(id), NoMeta {}, move || {
            self.source.coin(id)
        })
        .await
    }

    /// Fetches a coin's price chart (60s TTL by default)
    ///
    /// `days` is clamped to 1..=30.
    pub async fn coin_chart(&self, id: &str, days: u32) -> Result<Cached<ChartPayload>, ServiceError> {
        let days = days.clamp(params::MIN_DAYS, params::MAX_DAYS);
        self.fetch_cached(ResourceKind::Chart, &keys::chart(id, days), NoMeta {}, move || {
            self.source.market_chart(id, days)
        })
        .await
    }

    /// Fetches a coin's status updates (10min TTL by default)
    pub async fn status_updates(
        &self,
        id: &str,
    ) -> Result<Cached<StatusUpdatesPayload>, ServiceError> {
        self.fetch_cached(
            ResourceKind::StatusUpdates,
            &keys::status_updates(id),
            NoMeta {},
            move || self.source.status_updates(id),
        )
        .await
    }

    /// Fetches one page of the market listing (20s TTL by default)
    ///
    /// `page` is raised to at least 1 and `per_page` clamped to 10..=250.
    pub async fn market_page(
        &self,
        request: MarketsRequest,
    ) -> Result<Cached<MarketPagePayload>, ServiceError> {
        let request = MarketsRequest {
            page: request.page.max(1),
            per_page: request
                .per_page
                .clamp(params::MIN_PER_PAGE, params::MAX_PER_PAGE),
            category: request.category,
        };
        let meta = PageMeta {
            page: request.page,
            per_page: request.per_page,
            category: request.category.clone(),
        };
        let request = &request;
        self.fetch_cached(
            ResourceKind::MarketPage,
            &keys::market_page(request),
            meta,
            move || self.source.markets(request),
        )
        .await
    }

    /// Fetches the aggregated top-1000 listing (30s TTL by default)
    ///
    /// The four upstream pages are requested concurrently; if any of them fails
    /// the whole aggregate fails and nothing is merged.
    pub async fn top_markets(&self) -> Result<Cached<TopMarketsPayload>, ServiceError> {
        let meta = SourcePages {
            source_pages: TOP_MARKET_PAGES.to_vec(),
        };
        self.fetch_cached(ResourceKind::TopMarkets, keys::TOP_MARKETS, meta, move || async move {
            let requests: Vec<MarketsRequest> = TOP_MARKET_PAGES
                .iter()
                .map(|&page| MarketsRequest {
                    page,
                    per_page: TOP_MARKET_PER_PAGE,
                    category: None,
                })
                .collect();
            let pages = try_join_all(requests.iter().map(|r| self.source.markets(r))).await?;
            Ok(merge_by_rank(pages))
        })
        .await
    }

    /// Selects the biggest 24h gainers or losers from the top-1000 listing
    ///
    /// The result carries the cache status, `fetchedAt` and `stale` flag of the
    /// underlying listing.
    pub async fn movers(
        &self,
        mode: MoversMode,
        limit: usize,
    ) -> Result<Cached<MoversPayload>, ServiceError> {
        let top = self.top_markets().await?;
        let data = select_movers(&top.payload.data, mode, limit);

        Ok(Cached {
            payload: Payload {
                data,
                meta: MoversMeta { mode, limit },
                fetched_at: top.payload.fetched_at,
                stale: top.payload.stale,
            },
            status: top.status,
        })
    }

    /// Runs the cache policy for one resource
    async fn fetch_cached<T, M, F, Fut>(
        &self,
        resource: ResourceKind,
        key: &str,
        meta: M,
        fetch: F,
    ) -> Result<Cached<Payload<T, M>>, ServiceError>
    where
        T: Serialize + DeserializeOwned,
        M: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        let ttl = self.ttls.for_resource(resource);
        let previous: Option<CacheEntry<Payload<T, M>>> = cache::read(self.cache.as_ref(), key);

        let previous = match previous {
            Some(entry) if entry.is_fresh(ttl, Utc::now()) => {
                debug!(key, resource = resource.as_str(), "cache hit");
                return Ok(Cached {
                    payload: entry.value,
                    status: CacheStatus::Hit,
                });
            }
            other => other,
        };

        match fetch().await {
            Ok(data) => {
                let payload = Payload {
                    data,
                    meta,
                    fetched_at: Utc::now(),
                    stale: false,
                };
                if let Err(e) = cache::write(self.cache.as_ref(), key, &payload) {
                    warn!(key, error = %e, "failed to encode payload for cache");
                }
                debug!(key, resource = resource.as_str(), "cache miss, fetched upstream");
                Ok(Cached {
                    payload,
                    status: CacheStatus::Miss,
                })
            }
            Err(source) => match previous {
                Some(entry) => {
                    let now = Utc::now();
                    warn!(
                        key,
                        resource = resource.as_str(),
                        error = %source,
                        age_secs = entry.age(now).num_seconds(),
                        "upstream failed, serving stale cache entry"
                    );
                    Ok(Cached {
                        payload: Payload {
                            fetched_at: now,
                            stale: true,
                            ..entry.value
                        },
                        status: CacheStatus::Stale,
                    })
                }
                None => {
                    warn!(
                        key,
                        resource = resource.as_str(),
                        error = %source,
                        "upstream failed with nothing cached"
                    );
                    Err(ServiceError::NoCachedFallback { resource, source })
                }
            },
        }
    }
}
