//! Cache key construction
//!
//! Every key starts with its resource prefix, so keys of different resource kinds
//! never collide.

use crate::data::MarketsRequest;

/// Key of the aggregated top-1000 listing
pub const TOP_MARKETS: &str = "markets:top1000";

pub fn coin(id: &str) -> String {
    format!("coin:{}", id)
}

pub fn chart(id: &str, days: u32) -> String {
    format!("chart:{}:{}", id, days)
}

pub fn status_updates(id: &str) -> String {
    format!("status:{}", id)
}

/// Key of one market page; an absent category is keyed as `all`
pub fn market_page(request: &MarketsRequest) -> String {
    format!(
        "markets:{}:{}:{}",
        request.category.as_deref().unwrap_or("all"),
        request.page,
        request.per_page
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_prefixed_by_resource() {
        assert_eq!(coin("bitcoin"), "coin:bitcoin");
        assert_eq!(chart("bitcoin", 7), "chart:bitcoin:7");
        assert_eq!(status_updates("bitcoin"), "status:bitcoin");
    }

    #[test]
    fn test_market_page_key_defaults_category() {
        let request = MarketsRequest {
            page: 2,
            per_page: 50,
            category: None,
        };
        assert_eq!(market_page(&request), "markets:all:2:50");

        let request = MarketsRequest {
            category: Some("layer-2".to_string()),
            ..request
        };
        assert_eq!(market_page(&request), "markets:layer-2:2:50");
    }

    #[test]
    fn test_market_page_key_never_matches_top_markets() {
        let request = MarketsRequest {
            page: 1,
            per_page: 250,
            category: Some("top1000".to_string()),
        };
        assert_ne!(market_page(&request), TOP_MARKETS);
    }
}
