//! Background cache warming
//!
//! Periodically refreshes the aggregated market listing so that client polls
//! usually land on a fresh cache entry. Uses a tokio channel to signal shutdown.

use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::service::MarketService;

/// Configuration for the warming interval
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Interval between refreshes of the top markets listing
    pub interval: Duration,
    /// Whether warming is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            enabled: false,
        }
    }
}

impl RefreshConfig {
    /// Builds a config from an interval in seconds; zero disables warming
    pub fn from_secs(secs: u64) -> Self {
        Self {
            interval: Duration::from_secs(secs.max(1)),
            enabled: secs > 0,
        }
    }
}

/// Handle for controlling the background warming task
pub struct RefreshHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl RefreshHandle {
    /// Spawns the warming task if enabled
    ///
    /// The first tick is skipped so startup does not immediately hit upstream.
    pub fn spawn(service: MarketService, config: RefreshConfig) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = config.enabled.then(|| {
            let period = config.interval;
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(period);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            match service.top_markets().await {
                                Ok(cached) => debug!(
                                    status = cached.status.header_value(),
                                    rows = cached.payload.data.len(),
                                    "warmed top markets"
                                ),
                                Err(e) => warn!(error = %e, "failed to warm top markets"),
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            })
        });

        Self { shutdown_tx, task }
    }

    /// Whether a warming task is running
    pub fn is_running(&self) -> bool {
        self.task.as_ref().map(|t| !t.is_finished()).unwrap_or(false)
    }

    /// Stops the warming task and waits for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        if let Some(task) = self.task {
            let _ = task.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheStore, MemoryCache};
    use crate::data::{
        Chart, Coin, MarketRow, MarketSource, MarketsRequest, StatusUpdate, UpstreamError,
    };
    use crate::service::keys;
    use async_trait::async_trait;
    use std::sync::Arc;

    struct EmptyMarkets;

    #[async_trait]
    impl MarketSource for EmptyMarkets {
        async fn coin(&self, _id: &str) -> Result<Coin, UpstreamError> {
            Err(UpstreamError::InvalidBaseUrl("unused".to_string()))
        }

        async fn market_chart(&self, _id: &str, _days: u32) -> Result<Chart, UpstreamError> {
            Ok(Chart::default())
        }

        async fn status_updates(&self, _id: &str) -> Result<Vec<StatusUpdate>, UpstreamError> {
            Ok(Vec::new())
        }

        async fn markets(&self, _request: &MarketsRequest) -> Result<Vec<MarketRow>, UpstreamError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_refresh_config_default_is_disabled() {
        let config = RefreshConfig::default();
        assert!(!config.enabled);
    }

    #[test]
    fn test_refresh_config_from_secs() {
        let config = RefreshConfig::from_secs(15);
        assert!(config.enabled);
        assert_eq!(config.interval, Duration::from_secs(15));

        let config = RefreshConfig::from_secs(0);
        assert!(!config.enabled);
    }

    #[tokio::test]
    async fn test_spawn_disabled_runs_nothing() {
        let cache = Arc::new(MemoryCache::new());
        let service = MarketService::new(Arc::new(EmptyMarkets), cache.clone());

        let handle = RefreshHandle::spawn(service, RefreshConfig::default());
        assert!(!handle.is_running());
        handle.shutdown().await;
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_enabled_warmer_fills_top_markets() {
        let cache = Arc::new(MemoryCache::new());
        let service = MarketService::new(Arc::new(EmptyMarkets), cache.clone());

        let handle = RefreshHandle::spawn(service, RefreshConfig::from_secs(5));
        assert!(cache.get(keys::TOP_MARKETS).is_none());

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(cache.get(keys::TOP_MARKETS).is_some());

        handle.shutdown().await;
    }
}
