//! Market listing helpers
//!
//! Merging of fanned-out market pages and gainers/losers selection over a
//! merged listing.

use serde::{Deserialize, Serialize};

use super::MarketRow;

/// Rank assigned to rows without a market cap rank so they sort last
const MISSING_RANK: u64 = 1_000_000_000;

fn rank_key(row: &MarketRow) -> u64 {
    row.market_cap_rank.map(u64::from).unwrap_or(MISSING_RANK)
}

/// Concatenates market pages and sorts the result by rank, ascending
///
/// Rows without a rank are placed after all ranked rows. The sort is stable, so
/// rows with equal ranks keep their page order.
pub fn merge_by_rank(pages: Vec<Vec<MarketRow>>) -> Vec<MarketRow> {
    let mut rows: Vec<MarketRow> = pages.into_iter().flatten().collect();
    rows.sort_by_key(rank_key);
    rows
}

/// Which end of the 24h change distribution to select
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoversMode {
    /// Largest 24h gains first
    Gainers,
    /// Largest 24h losses first
    Losers,
}

impl MoversMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoversMode::Gainers => "gainers",
            MoversMode::Losers => "losers",
        }
    }
}

/// Selects the top movers by 24h price change
///
/// Rows without a 24h change are dropped. Gainers are the `limit` rows with the
/// highest change, highest first; losers are the `limit` rows with the lowest
/// change, lowest first.
pub fn select_movers(rows: &[MarketRow], mode: MoversMode, limit: usize) -> Vec<MarketRow> {
    let mut ranked: Vec<&MarketRow> = rows
        .iter()
        .filter(|row| {
            row.price_change_percentage_24h_in_currency
                .map(|pct| !pct.is_nan())
                .unwrap_or(false)
        })
        .collect();

    ranked.sort_by(|a, b| {
        let a = a.price_change_percentage_24h_in_currency.unwrap_or(f64::MIN);
        let b = b.price_change_percentage_24h_in_currency.unwrap_or(f64::MIN);
        b.total_cmp(&a)
    });

    match mode {
        MoversMode::Gainers => ranked.into_iter().take(limit).cloned().collect(),
        MoversMode::Losers => ranked.into_iter().rev().take(limit).cloned().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, rank: Option<u32>, change_24h: Option<f64>) -> MarketRow {
        MarketRow {
            id: id.to_string(),
            symbol: id.to_string(),
            name: id.to_uppercase(),
            image: format!("https://example.com/{}.png", id),
            current_price: Some(1.0),
            market_cap_rank: rank,
            market_cap: Some(100.0),
            total_volume: Some(10.0),
            price_change_percentage_1h_in_currency: None,
            price_change_percentage_24h_in_currency: change_24h,
            price_change_percentage_7d_in_currency: None,
            ..Default::default()
        }
    }

    #[test]
    fn test_merge_by_rank_sorts_across_pages() {
        let pages: Vec<Vec<MarketRow>> = (0..4u32)
            .map(|page| {
                // Reverse within each page and interleave ranks across pages
                (0..250u32)
                    .rev()
                    .map(|i| {
                        let rank = i * 4 + (3 - page) + 1;
                        row(&format!("coin-{}", rank), Some(rank), None)
                    })
                    .collect()
            })
            .collect();

        let merged = merge_by_rank(pages);

        assert_eq!(merged.len(), 1000);
        for (i, r) in merged.iter().enumerate() {
            assert_eq!(r.market_cap_rank, Some(i as u32 + 1));
        }
    }

    #[test]
    fn test_merge_by_rank_puts_missing_ranks_last() {
        let merged = merge_by_rank(vec![
            vec![row("unranked-a", None, None), row("b", Some(2), None)],
            vec![row("unranked-c", None, None), row("a", Some(1), None)],
        ]);

        let ids: Vec<&str> = merged.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "unranked-a", "unranked-c"]);
    }

    #[test]
    fn test_merge_by_rank_empty() {
        assert!(merge_by_rank(vec![vec![], vec![]]).is_empty());
    }

    #[test]
    fn test_select_gainers_orders_descending() {
        let rows = vec![
            row("flat", Some(1), Some(0.0)),
            row("up", Some(2), Some(12.5)),
            row("down", Some(3), Some(-8.0)),
            row("unknown", Some(4), None),
            row("moon", Some(5), Some(40.0)),
        ];

        let gainers = select_movers(&rows, MoversMode::Gainers, 2);
        let ids: Vec<&str> = gainers.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["moon", "up"]);
    }

    #[test]
    fn test_select_losers_orders_ascending() {
        let rows = vec![
            row("flat", Some(1), Some(0.0)),
            row("down", Some(2), Some(-8.0)),
            row("crash", Some(3), Some(-30.0)),
            row("unknown", Some(4), None),
        ];

        let losers = select_movers(&rows, MoversMode::Losers, 5);
        let ids: Vec<&str> = losers.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["crash", "down", "flat"]);
    }

    #[test]
    fn test_movers_mode_serde_names() {
        let mode: MoversMode = serde_json::from_str("\"losers\"").unwrap();
        assert_eq!(mode, MoversMode::Losers);
        assert_eq!(MoversMode::Gainers.as_str(), "gainers");
    }
}
