//! Grey-market quote parsing

use serde_json::Value;

use crate::normalize::{normalize_date, normalize_stock_code};
use crate::types::GreyMarketData;
use crate::value::{field_array, first_amount, first_number, first_text, is_success};

const PRICE_KEYS: &[&str] = &["greyPrice", "grey_price", "lastPrice", "price"];
const CHANGE_KEYS: &[&str] = &["greyChangeRate", "changeRate", "changePercent"];
const VOLUME_KEYS: &[&str] = &["greyVolume", "volume"];
const TURNOVER_KEYS: &[&str] = &["greyTurnover", "turnover", "amount"];
const IPO_PRICE_KEYS: &[&str] = &["ipoPricing", "ipopricing", "ipoPrice"];
const NAME_KEYS: &[&str] = &["shortName", "name"];
const CODE_KEYS: &[&str] = &["symbol", "code"];
const LISTING_DATE_KEYS: &[&str] = &["listedDate", "listingDate"];
const UPDATED_KEYS: &[&str] = &["updateTime", "lastUpdated"];

/// Parse a raw grey-list response body
pub fn parse_grey_list(body: &str, stock_code: &str, fetched_at: &str) -> Option<GreyMarketData> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    parse_grey_value(&envelope, stock_code, fetched_at)
}

/// Build a quote from the first row of the grey list
///
/// `fetched_at` stands in for the freshness timestamp when the row carries none.
pub fn parse_grey_value(
    envelope: &Value,
    stock_code: &str,
    fetched_at: &str,
) -> Option<GreyMarketData> {
    if !is_success(envelope) {
        return None;
    }

    let rows = match envelope.get("dataList") {
        Some(Value::Array(rows)) => rows.as_slice(),
        _ => envelope
            .get("data")
            .map(|data| field_array(data, "dataList"))
            .unwrap_or(&[]),
    };
    let row = rows.first().filter(|row| row.is_object())?;

    let code = first_text(row, CODE_KEYS);
    let updated = first_text(row, UPDATED_KEYS);

    Some(GreyMarketData {
        stock_code: normalize_stock_code(if code.is_empty() { stock_code } else { &code }),
        short_name: first_text(row, NAME_KEYS),
        current_price: first_number(row, PRICE_KEYS),
        change_percent: first_number(row, CHANGE_KEYS),
        volume: first_amount(row, VOLUME_KEYS),
        turnover: first_amount(row, TURNOVER_KEYS),
        ipo_pricing: first_number(row, IPO_PRICE_KEYS),
        listing_date: normalize_date(&first_text(row, LISTING_DATE_KEYS)),
        result_date: normalize_date(&first_text(row, &["resultDate"])),
        broker_quotes: Vec::new(),
        last_updated: if updated.is_empty() {
            fetched_at.to_string()
        } else {
            updated
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FETCHED_AT: &str = "2025-06-29T10:00:00Z";

    #[test]
    fn test_parse_first_row_only() {
        let envelope = json!({
            "result": 1,
            "dataList": [
                {
                    "symbol": "6603",
                    "shortName": "IFBH",
                    "greyPrice": "30.5",
                    "greyChangeRate": 9.71,
                    "greyVolume": "1,234,000",
                    "greyTurnover": "3,760万",
                    "ipoPricing": 27.8,
                    "listedDate": "2025-06-30T00:00:00",
                    "resultDate": "2025-06-27T00:00:00",
                    "updateTime": "2025-06-27 18:30:00"
                },
                {"symbol": "02590", "greyPrice": 1.0}
            ]
        });

        let grey = parse_grey_value(&envelope, "06603", FETCHED_AT).unwrap();

        assert_eq!(grey.stock_code, "06603");
        assert_eq!(grey.short_name, "IFBH");
        assert_eq!(grey.current_price, 30.5);
        assert_eq!(grey.change_percent, 9.71);
        assert_eq!(grey.volume, 1234000.0);
        assert_eq!(grey.turnover, 3760.0);
        assert_eq!(grey.ipo_pricing, 27.8);
        assert_eq!(grey.listing_date, "2025-06-30");
        assert_eq!(grey.result_date, "2025-06-27");
        assert_eq!(grey.last_updated, "2025-06-27 18:30:00");
        assert!(grey.broker_quotes.is_empty());
    }

    #[test]
    fn test_synonyms_and_nested_rows() {
        let envelope = json!({
            "result": "1",
            "data": {
                "dataList": [{
                    "name": "Science Robotics",
                    "lastPrice": 9.1,
                    "changePercent": "-2.5",
                    "amount": 500,
                    "ipoPrice": "9.33",
                    "listingDate": "2025/07/03"
                }]
            }
        });

        let grey = parse_grey_value(&envelope, "2590", FETCHED_AT).unwrap();

        assert_eq!(grey.stock_code, "02590");
        assert_eq!(grey.short_name, "Science Robotics");
        assert_eq!(grey.current_price, 9.1);
        assert_eq!(grey.change_percent, -2.5);
        assert_eq!(grey.turnover, 500.0);
        assert_eq!(grey.ipo_pricing, 9.33);
        assert_eq!(grey.listing_date, "2025-07-03");
        assert_eq!(grey.last_updated, FETCHED_AT);
    }

    #[test]
    fn test_absent_when_no_rows() {
        let bodies = [
            json!({"result": 1, "dataList": []}),
            json!({"result": 1}),
            json!({"result": 0, "dataList": [{"symbol": "06603"}]}),
            json!({"result": 1, "dataList": ["06603"]}),
        ];

        for envelope in bodies {
            assert!(parse_grey_value(&envelope, "06603", FETCHED_AT).is_none(), "{envelope}");
        }
        assert!(parse_grey_list("<html></html>", "06603", FETCHED_AT).is_none());
    }
}
