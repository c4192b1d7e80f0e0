//! Placing (allocation) result parsing
//!
//! The allocation tiers arrive as fixed-position tuples rather than named
//! objects:
//!
//! ```text
//! [shares, applicants, successfulApplicants, winningRate, allocationDetails, isPlacee, amount]
//! ```

use serde_json::Value;

use crate::normalize::{normalize_stock_code, parse_amount};
use crate::types::{AllocationLevel, PlacingResult};
use crate::value::{amount, field_amount, field_array, first_text, is_success, number, text};

/// Parse a raw placing-result response body
pub fn parse_placing_result(body: &str, stock_code: &str) -> Option<PlacingResult> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    parse_placing_value(&envelope, stock_code)
}

/// Parse an already decoded placing-result envelope
///
/// The payload may sit under `data` or at the top level. An explicit failure
/// code, or a payload without a `list` array, means no result is available.
pub fn parse_placing_value(envelope: &Value, stock_code: &str) -> Option<PlacingResult> {
    if envelope.get("result").is_some() && !is_success(envelope) {
        return None;
    }

    let payload = envelope
        .get("data")
        .filter(|data| data.is_object())
        .unwrap_or(envelope);

    if !payload.get("list").is_some_and(Value::is_array) {
        return None;
    }

    let allocation_list = field_array(payload, "list")
        .iter()
        .filter_map(Value::as_array)
        .map(|tuple| allocation_level_from_tuple(tuple))
        .collect();

    let symbol = first_text(payload, &["symbol", "code"]);
    let code = if symbol.is_empty() { stock_code } else { &symbol };
    let allocation_result_url = first_text(payload, &["allocationresulturl", "resultUrl"]);

    Some(PlacingResult {
        stock_code: normalize_stock_code(code),
        stock_name: first_text(payload, &["stockname", "shortName", "name"]),
        lot_size: field_amount(payload, "lotsize"),
        total_shares: field_amount(payload, "totalshares"),
        allocation_rate: field_amount(payload, "allocationrate"),
        claw_back: field_amount(payload, "clawback"),
        subscribed: field_amount(payload, "subscribed"),
        placement_times: field_amount(payload, "placementtimes"),
        codes_rate: field_amount(payload, "codesrate"),
        head_hammer: field_amount(payload, "headhammer"),
        price_ceiling: field_amount(payload, "priceceiling"),
        price_floor: field_amount(payload, "pricefloor"),
        ipo_pricing: field_amount(payload, "ipopricing"),
        raise_money: field_amount(payload, "raisemoney"),
        invalid_application: field_amount(payload, "invalidapplication"),
        allocation_result_url: (!allocation_result_url.is_empty()).then_some(allocation_result_url),
        allocation_list,
    })
}

/// Map one positional tier tuple
///
/// Missing or unparsable positions default to zero, except the number of
/// successful applicants, which stays `None` so that "not reported" is not
/// confused with "nobody won".
pub fn allocation_level_from_tuple(tuple: &[Value]) -> AllocationLevel {
    let at = |index: usize| tuple.get(index).unwrap_or(&Value::Null);

    AllocationLevel {
        shares: whole(amount(at(0))),
        applicants: whole(amount(at(1))),
        successful_applicants: optional_count(at(2)),
        winning_rate: amount(at(3)),
        allocation_details: text(at(4)),
        is_placee: number(at(5)).trunc() as i64,
        amount: amount(at(6)),
    }
}

fn whole(n: f64) -> u64 {
    if n > 0.0 {
        n.trunc() as u64
    } else {
        0
    }
}

fn optional_count(value: &Value) -> Option<u64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned = s.trim();
            if cleaned.is_empty() || cleaned.chars().all(|c| c == '-') {
                return None;
            }
            let parsed = parse_amount(cleaned);
            // parse_amount maps garbage to 0; only accept a real zero
            if parsed == 0.0 && !cleaned.starts_with('0') {
                return None;
            }
            parsed
        }
        _ => return None,
    };

    (n.is_finite() && n >= 0.0).then(|| n.trunc() as u64)
}
