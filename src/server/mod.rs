//! HTTP server exposing the cached market data routes

pub mod error;
pub mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use crate::service::MarketService;

pub use error::{ApiError, ApiResult, ErrorBody};
pub use routes::CACHE_HEADER;

/// Shared state handed to every route handler
#[derive(Clone)]
pub struct AppState {
    pub service: MarketService,
}

impl AppState {
    pub fn new(service: MarketService) -> Self {
        Self { service }
    }
}

/// Builds the API router with request tracing
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/coin/:id", get(routes::coin_detail))
        .route("/api/coin/:id/chart", get(routes::coin_chart))
        .route("/api/coin/:id/status-updates", get(routes::status_updates))
        .route("/api/markets", get(routes::market_page))
        .route("/api/markets-all", get(routes::top_markets))
        .route("/api/movers", get(routes::movers))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
