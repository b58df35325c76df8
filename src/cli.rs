//! Command-line interface parsing for the coinboard server
//!
//! This module handles parsing of CLI arguments using clap, with environment
//! variable fallbacks for the bind address, upstream URL, API key and cache
//! warming interval.

use std::net::SocketAddr;

use clap::Parser;
use thiserror::Error;
use url::Url;

use crate::data::client::COINGECKO_BASE_URL;
use crate::data::UpstreamConfig;
use crate::refresh::RefreshConfig;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The bind address is not a valid `host:port` socket address
    #[error("Invalid bind address: '{0}'. Expected host:port, e.g. 127.0.0.1:3000")]
    InvalidBindAddress(String),

    /// The upstream URL cannot be parsed or is not http(s)
    #[error("Invalid upstream URL: '{url}': {reason}")]
    InvalidUpstreamUrl { url: String, reason: String },
}

/// Coinboard - cached cryptocurrency market data API
#[derive(Parser, Debug)]
#[command(name = "coinboard")]
#[command(about = "Caching proxy for cryptocurrency market data")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "COINBOARD_BIND", default_value = "127.0.0.1:3000")]
    pub bind: String,

    /// Base URL of the upstream market data API
    #[arg(long, env = "COINGECKO_BASE_URL", default_value = COINGECKO_BASE_URL)]
    pub upstream_url: String,

    /// API key sent to the upstream API
    #[arg(long, env = "COINGECKO_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Refresh the top markets listing in the background every N seconds (0 = off)
    #[arg(long, env = "COINBOARD_WARM_INTERVAL_SECS", default_value_t = 0)]
    pub warm_interval_secs: u64,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// Validated configuration for server startup
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub upstream: UpstreamConfig,
    pub refresh: RefreshConfig,
    pub log_json: bool,
}

/// Parses and validates the upstream base URL
///
/// # Returns
/// * `Ok(Url)` if the URL is absolute, http(s), and can take path segments
/// * `Err(CliError::InvalidUpstreamUrl)` otherwise
pub fn parse_upstream_url(s: &str) -> Result<Url, CliError> {
    let invalid = |reason: &str| CliError::InvalidUpstreamUrl {
        url: s.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(s.trim()).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot have API paths appended"));
    }
    Ok(url)
}

impl ServerConfig {
    /// Creates a ServerConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ServerConfig)` with validated settings
    /// * `Err(CliError)` if the bind address or upstream URL is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let bind = cli
            .bind
            .trim()
            .parse::<SocketAddr>()
            .map_err(|_| CliError::InvalidBindAddress(cli.bind.clone()))?;
        let base_url = parse_upstream_url(&cli.upstream_url)?;

        Ok(ServerConfig {
            bind,
            upstream: UpstreamConfig::new(base_url).with_api_key(cli.api_key.clone()),
            refresh: RefreshConfig::from_secs(cli.warm_interval_secs),
            log_json: cli.log_json,
        })
    }
}
