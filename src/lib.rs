//! Coinboard Library
//!
//! A caching proxy for the CoinGecko market data API. Responses are held in a
//! TTL cache and served stale when the upstream API fails.

pub mod cache;
pub mod cli;
pub mod data;
pub mod refresh;
pub mod server;
pub mod service;
pub mod telemetry;
