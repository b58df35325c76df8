//! Route handlers for the market data API
//!
//! Each handler normalises its query parameters, calls the service and writes the
//! payload as JSON with an `x-cache` header describing how it was produced.

use axum::{
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use url::form_urlencoded;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::data::{MarketsRequest, MoversMode};
use crate::service::{params, Cached};

/// Response header reporting HIT, MISS or STALE
pub const CACHE_HEADER: &str = "x-cache";

fn cached_json<P: Serialize>(cached: Cached<P>) -> Response {
    (
        [(CACHE_HEADER, cached.status.header_value())],
        Json(cached.payload),
    )
        .into_response()
}

/// Decoded query string pairs
///
/// Lookups return the first value of a repeated key, so `?page=1&page=2` reads
/// page 1 instead of rejecting the request.
#[derive(Debug, Default)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(query) => Self(form_urlencoded::parse(query.as_bytes()).into_owned().collect()),
            None => Self::default(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// GET /api/coin/:id
pub async fn coin_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let cached = state.service.coin_detail(&id).await?;
    Ok(cached_json(cached))
}

/// GET /api/coin/:id/chart?days=
pub async fn coin_chart(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let query = QueryParams::parse(query.as_deref());
    let days = params::days(query.get("days"));
    let cached = state.service.coin_chart(&id, days).await?;
    Ok(cached_json(cached))
}

/// GET /api/coin/:id/status-updates
pub async fn status_updates(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let cached = state.service.status_updates(&id).await?;
    Ok(cached_json(cached))
}

/// GET /api/markets?page=&per_page=&category=
pub async fn market_page(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let query = QueryParams::parse(query.as_deref());
    let request = MarketsRequest {
        page: params::page(query.get("page")),
        per_page: params::per_page(query.get("per_page")),
        category: params::category(query.get("category")),
    };
    let cached = state.service.market_page(request).await?;
    Ok(cached_json(cached))
}

/// GET /api/markets-all
pub async fn top_markets(State(state): State<AppState>) -> ApiResult<Response> {
    let cached = state.service.top_markets().await?;
    Ok(cached_json(cached))
}

/// GET /api/movers?mode=gainers|losers&limit=
pub async fn movers(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> ApiResult<Response> {
    let query = QueryParams::parse(query.as_deref());
    let mode = match query.get("mode").map(str::trim) {
        None | Some("") | Some("gainers") => MoversMode::Gainers,
        Some("losers") => MoversMode::Losers,
        Some(other) => {
            return Err(ApiError::bad_request(format!(
                "Invalid mode '{}': expected gainers or losers",
                other
            )))
        }
    };
    let limit = params::movers_limit(query.get("limit"));
    let cached = state.service.movers(mode, limit).await?;
    Ok(cached_json(cached))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_first_value_wins() {
        let query = QueryParams::parse(Some("page=2&page=3&category=layer-1"));
        assert_eq!(query.get("page"), Some("2"));
        assert_eq!(query.get("category"), Some("layer-1"));
        assert_eq!(query.get("per_page"), None);
    }

    #[test]
    fn test_query_params_decodes_values() {
        let query = QueryParams::parse(Some("category=decentralized%20finance&mode=top+gainers"));
        assert_eq!(query.get("category"), Some("decentralized finance"));
        assert_eq!(query.get("mode"), Some("top gainers"));
        assert!(QueryParams::parse(None).get("days").is_none());
    }
}
