//! Normalization of codes, prices, amounts and dates
//!
//! Upstream payloads mix numbers, numeric strings with unit suffixes, and dates
//! in several layouts. These functions collapse them into the fixed shapes the
//! output records use.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Width of a normalized Hong Kong stock code
pub const STOCK_CODE_WIDTH: usize = 5;

/// Currency suffix appended to rendered prices
pub const PRICE_SUFFIX: &str = "港元";

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Zero-pad a stock code to five digits
///
/// Idempotent: an already padded code is returned unchanged.
pub fn normalize_stock_code(raw: &str) -> String {
    let trimmed = raw.trim();
    format!("{trimmed:0>width$}", width = STOCK_CODE_WIDTH)
}

/// The `code` parameter expected by the detail endpoint (`E` + padded code)
pub fn detail_code_param(stock_code: &str) -> String {
    format!("E{}", normalize_stock_code(stock_code))
}

/// Render an offer price range
///
/// Zero means "not provided". Equal bounds collapse to a single price.
pub fn format_price_range(floor: f64, ceiling: f64) -> String {
    let has_floor = floor > 0.0;
    let has_ceiling = ceiling > 0.0;

    match (has_floor, has_ceiling) {
        (false, false) => String::new(),
        (true, false) => format!("{floor}{PRICE_SUFFIX}"),
        (false, true) => format!("{ceiling}{PRICE_SUFFIX}"),
        (true, true) if floor == ceiling => format!("{ceiling}{PRICE_SUFFIX}"),
        (true, true) => format!("{floor}-{ceiling}{PRICE_SUFFIX}"),
    }
}

/// Parse the leading numeric portion of a string, the way `parseFloat` does
///
/// Returns `None` when the string does not start with a number.
pub fn parse_leading_number(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if frac_end > frac_start || digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    // Optional exponent, only consumed when it is complete
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && (bytes[exp_end] == b'+' || bytes[exp_end] == b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
}

/// Parse a monetary amount such as `"12,345万"`, `"3.2亿"` or `"--"`
///
/// Unit suffixes and thousands separators are stripped; the magnitude is not
/// rescaled. Anything unparsable is `0`.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '万' | '亿' | ',' | '，' | '%') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '-') {
        return 0.0;
    }

    parse_leading_number(&cleaned).unwrap_or(0.0)
}

/// Reduce a date or datetime string to `YYYY-MM-DD`
///
/// Accepts ISO/RFC 3339 timestamps, space separated datetimes, slash and compact
/// dates, and ASP.NET `/Date(ms)/` literals. The calendar date is taken as
/// written; unparsable input yields an empty string.
pub fn normalize_date(raw: &str) -> String {
    parse_date(raw)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(date) = parse_dotnet_date(s) {
        return Some(date);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt.date());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Some(date);
        }
    }

    // Fall back to a leading date followed by anything else
    let prefix = s.get(..10)?;
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(prefix, format).ok())
}

/// `/Date(1719705600000)/`, interpreted in Hong Kong time (UTC+8)
fn parse_dotnet_date(s: &str) -> Option<NaiveDate> {
    let inner = s.strip_prefix("/Date(")?.strip_suffix(")/")?;
    let millis_end = inner
        .find(|c: char| c == '+' || (c == '-' && !inner.starts_with(c)))
        .unwrap_or(inner.len());
    let millis: i64 = inner[..millis_end].parse().ok()?;
    let offset = FixedOffset::east_opt(8 * 3600)?;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Render `start - end` for a subscription period, or one side if the other is missing
pub fn format_period(start: &str, end: &str) -> String {
    let start = normalize_date(start);
    let end = normalize_date(end);

    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => start,
        (true, false) => end,
        (false, false) => format!("{start} - {end}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_stock_code_pads() {
        assert_eq!(normalize_stock_code("6603"), "06603");
        assert_eq!(normalize_stock_code("700"), "00700");
        assert_eq!(normalize_stock_code(" 1304 "), "01304");
    }

    #[test]
    fn test_normalize_stock_code_idempotent() {
        assert_eq!(normalize_stock_code("06603"), "06603");
        let once = normalize_stock_code("6603");
        assert_eq!(normalize_stock_code(&once), once);
    }

    #[test]
    fn test_detail_code_param() {
        assert_eq!(detail_code_param("1304"), "E01304");
        assert_eq!(detail_code_param("06603"), "E06603");
    }

    #[test]
    fn test_format_price_range_single() {
        assert_eq!(format_price_range(10.2, 10.2), "10.2港元");
    }

    #[test]
    fn test_format_price_range_range() {
        assert_eq!(format_price_range(8.0, 10.0), "8-10港元");
    }

    #[test]
    fn test_format_price_range_missing_bounds() {
        assert_eq!(format_price_range(0.0, 0.0), "");
        assert_eq!(format_price_range(0.0, 5.5), "5.5港元");
        assert_eq!(format_price_range(3.1, 0.0), "3.1港元");
    }

    #[test]
    fn test_parse_leading_number() {
        assert_eq!(parse_leading_number("18.8"), Some(18.8));
        assert_eq!(parse_leading_number("15.2倍"), Some(15.2));
        assert_eq!(parse_leading_number("  -3"), Some(-3.0));
        assert_eq!(parse_leading_number(".5"), Some(0.5));
        assert_eq!(parse_leading_number("1e3x"), Some(1000.0));
        assert_eq!(parse_leading_number("12."), Some(12.0));
        assert_eq!(parse_leading_number("abc"), None);
        assert_eq!(parse_leading_number(""), None);
        assert_eq!(parse_leading_number("-"), None);
    }

    #[test]
    fn test_parse_amount_strips_units_and_separators() {
        assert_eq!(parse_amount("12,345万"), 12345.0);
        assert_eq!(parse_amount("3.2亿"), 3.2);
        assert_eq!(parse_amount("1,234,567"), 1234567.0);
    }

    #[test]
    fn test_parse_amount_placeholders() {
        assert_eq!(parse_amount("--"), 0.0);
        assert_eq!(parse_amount("-"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("N/A"), 0.0);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("2025-06-30T00:00:00"), "2025-06-30");
        assert_eq!(normalize_date("2025-06-30T09:30:00.123"), "2025-06-30");
        assert_eq!(normalize_date("2025-06-30T23:00:00+08:00"), "2025-06-30");
        assert_eq!(normalize_date("2025-06-30 12:00:00"), "2025-06-30");
        assert_eq!(normalize_date("2025/06/30"), "2025-06-30");
        assert_eq!(normalize_date("20250630"), "2025-06-30");
        assert_eq!(normalize_date("2025-06-30"), "2025-06-30");
    }

    #[test]
    fn test_normalize_date_dotnet_literal() {
        // 2024-06-30T00:00:00+08:00
        assert_eq!(normalize_date("/Date(1719676800000)/"), "2024-06-30");
    }

    #[test]
    fn test_normalize_date_invalid() {
        assert_eq!(normalize_date(""), "");
        assert_eq!(normalize_date("--"), "");
        assert_eq!(normalize_date("soon"), "");
    }

    #[test]
    fn test_format_period() {
        assert_eq!(
            format_period("2025-06-25T00:00:00", "2025-06-30T00:00:00"),
            "2025-06-25 - 2025-06-30"
        );
        assert_eq!(format_period("2025-06-25", ""), "2025-06-25");
        assert_eq!(format_period("", ""), "");
    }
}
