//! Query parameter normalisation
//!
//! Raw query values are parsed leniently: anything that is not a finite number
//! falls back to the default, and the result is clamped into the allowed range.

/// Default number of days of chart history
pub const DEFAULT_DAYS: u32 = 7;
pub const MIN_DAYS: u32 = 1;
pub const MAX_DAYS: u32 = 30;

pub const DEFAULT_PAGE: u32 = 1;

/// Default market page size
pub const DEFAULT_PER_PAGE: u32 = 50;
pub const MIN_PER_PAGE: u32 = 10;
pub const MAX_PER_PAGE: u32 = 250;

/// Default number of rows returned by the movers view
pub const DEFAULT_MOVERS_LIMIT: u32 = 50;
pub const MAX_MOVERS_LIMIT: u32 = 250;

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

fn clamped(raw: Option<&str>, default: u32, min: u32, max: u32) -> u32 {
    let value = parse_number(raw).unwrap_or(f64::from(default));
    value.clamp(f64::from(min), f64::from(max)).floor() as u32
}

/// Chart range in days: default 7, clamped to 1..=30
pub fn days(raw: Option<&str>) -> u32 {
    clamped(raw, DEFAULT_DAYS, MIN_DAYS, MAX_DAYS)
}

/// Market page number: default 1, at least 1
pub fn page(raw: Option<&str>) -> u32 {
    clamped(raw, DEFAULT_PAGE, 1, u32::MAX)
}

/// Market page size: default 50, clamped to 10..=250
pub fn per_page(raw: Option<&str>) -> u32 {
    clamped(raw, DEFAULT_PER_PAGE, MIN_PER_PAGE, MAX_PER_PAGE)
}

/// Category filter: trimmed, with empty values treated as absent
pub fn category(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Movers row count: default 50, clamped to 1..=250
pub fn movers_limit(raw: Option<&str>) -> usize {
    clamped(raw, DEFAULT_MOVERS_LIMIT, 1, MAX_MOVERS_LIMIT) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_defaults_and_clamps() {
        assert_eq!(days(None), 7);
        assert_eq!(days(Some("")), 7);
        assert_eq!(days(Some("0")), 1);
        assert_eq!(days(Some("-5")), 1);
        assert_eq!(days(Some("14")), 14);
        assert_eq!(days(Some("100")), 30);
        assert_eq!(days(Some("abc")), 7);
    }

    #[test]
    fn test_per_page_clamps() {
        assert_eq!(per_page(None), 50);
        assert_eq!(per_page(Some("5")), 10);
        assert_eq!(per_page(Some("9999")), 250);
        assert_eq!(per_page(Some("100")), 100);
    }

    #[test]
    fn test_page_has_lower_bound_only() {
        assert_eq!(page(None), 1);
        assert_eq!(page(Some("0")), 1);
        assert_eq!(page(Some("-3")), 1);
        assert_eq!(page(Some("42")), 42);
        assert_eq!(page(Some("NaN")), 1);
    }

    #[test]
    fn test_fractional_values_are_floored() {
        assert_eq!(days(Some("2.9")), 2);
        assert_eq!(page(Some("3.5")), 3);
    }

    #[test]
    fn test_category_trims_and_drops_empty() {
        assert_eq!(category(None), None);
        assert_eq!(category(Some("   ")), None);
        assert_eq!(category(Some(" layer-1 ")), Some("layer-1".to_string()));
    }

    #[test]
    fn test_movers_limit_clamps() {
        assert_eq!(movers_limit(None), 50);
        assert_eq!(movers_limit(Some("0")), 1);
        assert_eq!(movers_limit(Some("1000")), 250);
    }
}
