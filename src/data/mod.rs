//! Upstream market data models
//!
//! This module contains the data types returned by the CoinGecko API for coin
//! detail, price charts, status updates and market listings, plus the client
//! used to fetch them.

pub mod client;
pub mod markets;

pub use client::{CoinGeckoClient, MarketSource, MarketsRequest, UpstreamConfig, UpstreamError};
pub use markets::{merge_by_rank, select_movers, MoversMode};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Upstream fields that are not modelled, kept so responses pass through intact
pub type Extra = Map<String, Value>;

/// A value quoted in US dollars
///
/// CoinGecko nests per-currency values (`{"usd": 1.0, "eur": 0.9}`); other
/// currencies are kept in `other`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Usd {
    #[serde(default)]
    pub usd: Option<f64>,
    #[serde(flatten)]
    pub other: Extra,
}

/// Market figures for a single coin
///
/// Only the fields the service reads are typed; `market_cap`, ATH/ATL, supplies
/// and the rest stay in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CoinMarketData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<Usd>,
    /// Position by market cap; null for unranked coins
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percentage_24h_in_currency: Option<Usd>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Detailed information about a single coin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Coin {
    /// CoinGecko identifier (e.g., "bitcoin")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_data: Option<CoinMarketData>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Coin {
    /// Current USD price, if upstream reported market data
    pub fn usd_price(&self) -> Option<f64> {
        self.market_data
            .as_ref()
            .and_then(|m| m.current_price.as_ref())
            .and_then(|p| p.usd)
    }
}

/// Historical price series for a coin
///
/// Each point is `(unix_millis, price_usd)`. Market cap and volume series are
/// kept untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub prices: Vec<(f64, f64)>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A project announcement published for a coin
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatusUpdate {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_title: Option<String>,
    #[serde(default)]
    pub pin: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// One row of the `/coins/markets` listing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketRow {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub current_price: Option<f64>,
    /// Position by market cap; missing for very small or unranked coins
    #[serde(default)]
    pub market_cap_rank: Option<u32>,
    #[serde(default)]
    pub market_cap: Option<f64>,
    #[serde(default)]
    pub total_volume: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_1h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_24h_in_currency: Option<f64>,
    #[serde(default)]
    pub price_change_percentage_7d_in_currency: Option<f64>,
    #[serde(flatten)]
    pub extra: Extra,
}
