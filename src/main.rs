//! Coinboard - cached cryptocurrency market data API
//!
//! Serves coin detail, charts, status updates and market listings from the
//! CoinGecko API through a short-lived cache with stale-on-error fallback.

use std::sync::Arc;

use clap::Parser;

use coinboard::cache::MemoryCache;
use coinboard::cli::{Cli, ServerConfig};
use coinboard::data::CoinGeckoClient;
use coinboard::refresh::RefreshHandle;
use coinboard::server::{self, AppState};
use coinboard::service::MarketService;
use coinboard::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = ServerConfig::from_cli(&cli)?;

    telemetry::init_tracing(config.log_json)?;

    let source = Arc::new(CoinGeckoClient::new(config.upstream.clone()));
    let cache = Arc::new(MemoryCache::new());
    let service = MarketService::new(source, cache);

    let refresh = RefreshHandle::spawn(service.clone(), config.refresh.clone());
    let app = server::router(AppState::new(service));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!(
        addr = %config.bind,
        upstream = %config.upstream.base_url,
        api_key = config.upstream.api_key.is_some(),
        warm_interval_secs = config.refresh.enabled.then(|| config.refresh.interval.as_secs()),
        "Starting coinboard server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await?;

    refresh.shutdown().await;
    Ok(())
}
