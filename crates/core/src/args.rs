//! Tool argument validation
//!
//! Raw `tools/call` arguments are loose JSON. They are checked and coerced here
//! into a [`ToolCall`] before anything touches the network.

use serde_json::{Map, Value};

use crate::normalize::{normalize_stock_code, STOCK_CODE_WIDTH};

pub const LIST_ACTIVE_IPOS: &str = "list_active_ipos";
pub const GET_IPO_DETAILS: &str = "get_ipo_details";
pub const GET_ALLOCATION_INFO: &str = "get_allocation_info";
pub const GET_GREY_MARKET_DATA: &str = "get_grey_market_data";
pub const GET_FIRST_DAY_PERFORMANCE: &str = "get_first_day_performance";
pub const SEARCH_IPO_BY_NAME: &str = "search_ipo_by_name";
pub const GET_MARKET_OVERVIEW: &str = "get_market_overview";

pub const DEFAULT_PAGE_INDEX: u64 = 1;
pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 100;
pub const DEFAULT_DAYS: u32 = 30;
pub const MAX_DAYS: u32 = 365;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ToolArgsError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Tool arguments must be an object")]
    NotAnObject,

    #[error("Missing required argument: {0}")]
    Missing(&'static str),

    #[error("Invalid argument {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// A validated tool invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolCall {
    ListActiveIpos {
        industry: String,
        page_index: u64,
        page_size: u64,
    },
    GetIpoDetails {
        stock_code: String,
    },
    GetAllocationInfo {
        stock_code: String,
    },
    GetGreyMarketData {
        stock_code: String,
    },
    GetFirstDayPerformance {
        stock_code: String,
    },
    SearchIpoByName {
        company_name: String,
        exact_match: bool,
    },
    GetMarketOverview {
        days: u32,
    },
}

impl ToolCall {
    /// Validate the arguments of the tool called `name`
    ///
    /// Stock codes are zero-padded, page sizes and day windows clamped to their
    /// allowed ranges.
    pub fn parse(name: &str, arguments: Option<&Value>) -> Result<Self, ToolArgsError> {
        let empty = Map::new();
        let args = match arguments {
            None | Some(Value::Null) => &empty,
            Some(Value::Object(map)) => map,
            Some(_) => return Err(ToolArgsError::NotAnObject),
        };

        let call = match name {
            LIST_ACTIVE_IPOS => Self::ListActiveIpos {
                industry: optional_string(args, "industry")?.unwrap_or_default(),
                page_index: optional_integer(args, "pageIndex")?
                    .unwrap_or(DEFAULT_PAGE_INDEX)
                    .max(1),
                page_size: optional_integer(args, "pageSize")?
                    .unwrap_or(DEFAULT_PAGE_SIZE)
                    .clamp(1, MAX_PAGE_SIZE),
            },
            GET_IPO_DETAILS => Self::GetIpoDetails {
                stock_code: stock_code(args)?,
            },
            GET_ALLOCATION_INFO => Self::GetAllocationInfo {
                stock_code: stock_code(args)?,
            },
            GET_GREY_MARKET_DATA => Self::GetGreyMarketData {
                stock_code: stock_code(args)?,
            },
            GET_FIRST_DAY_PERFORMANCE => Self::GetFirstDayPerformance {
                stock_code: stock_code(args)?,
            },
            SEARCH_IPO_BY_NAME => Self::SearchIpoByName {
                company_name: optional_string(args, "company_name")?
                    .filter(|name| !name.is_empty())
                    .ok_or(ToolArgsError::Missing("company_name"))?,
                exact_match: optional_bool(args, "exact_match")?.unwrap_or(false),
            },
            GET_MARKET_OVERVIEW => Self::GetMarketOverview {
                days: optional_integer(args, "days")?
                    .map(|days| days.clamp(1, u64::from(MAX_DAYS)) as u32)
                    .unwrap_or(DEFAULT_DAYS),
            },
            other => return Err(ToolArgsError::UnknownTool(other.to_string())),
        };

        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::ListActiveIpos { .. } => LIST_ACTIVE_IPOS,
            Self::GetIpoDetails { .. } => GET_IPO_DETAILS,
            Self::GetAllocationInfo { .. } => GET_ALLOCATION_INFO,
            Self::GetGreyMarketData { .. } => GET_GREY_MARKET_DATA,
            Self::GetFirstDayPerformance { .. } => GET_FIRST_DAY_PERFORMANCE,
            Self::SearchIpoByName { .. } => SEARCH_IPO_BY_NAME,
            Self::GetMarketOverview { .. } => GET_MARKET_OVERVIEW,
        }
    }
}

/// Shortest code a caller may pass, matching the `^[0-9]{4,5}$` input schema
const MIN_STOCK_CODE_DIGITS: usize = 4;

/// Check a user-supplied stock code and pad it to five digits
///
/// Accepts four or five ASCII digits.
pub fn validate_stock_code(raw: &str) -> Result<String, ToolArgsError> {
    let code = raw.trim();

    if code.is_empty() {
        return Err(ToolArgsError::Missing("stock_code"));
    }

    if !(MIN_STOCK_CODE_DIGITS..=STOCK_CODE_WIDTH).contains(&code.len())
        || !code.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ToolArgsError::Invalid {
            field: "stock_code",
            reason: format!(
                "expected {MIN_STOCK_CODE_DIGITS} to {STOCK_CODE_WIDTH} digits, got {code:?}"
            ),
        });
    }

    Ok(normalize_stock_code(code))
}

fn stock_code(args: &Map<String, Value>) -> Result<String, ToolArgsError> {
    match args.get("stock_code") {
        None | Some(Value::Null) => Err(ToolArgsError::Missing("stock_code")),
        Some(Value::String(s)) => validate_stock_code(s),
        Some(Value::Number(n)) => match n.as_u64() {
            Some(n) => validate_stock_code(&n.to_string()),
            None => Err(invalid("stock_code", "expected a non-negative integer")),
        },
        Some(_) => Err(invalid("stock_code", "expected a string")),
    }
}

fn optional_string(
    args: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ToolArgsError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(_) => Err(invalid(field, "expected a string")),
    }
}

fn optional_integer(
    args: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<u64>, ToolArgsError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => {
            if let Some(n) = n.as_u64() {
                return Ok(Some(n));
            }
            match n.as_f64() {
                Some(f) if f.is_finite() && f.fract() == 0.0 => Ok(Some(f.max(0.0) as u64)),
                _ => Err(invalid(field, "expected an integer")),
            }
        }
        Some(Value::String(s)) => s
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| invalid(field, "expected an integer")),
        Some(_) => Err(invalid(field, "expected an integer")),
    }
}

fn optional_bool(
    args: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<bool>, ToolArgsError> {
    match args.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => match s.trim() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid(field, "expected a boolean")),
        },
        Some(_) => Err(invalid(field, "expected a boolean")),
    }
}

fn invalid(field: &'static str, reason: &str) -> ToolArgsError {
    ToolArgsError::Invalid {
        field,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_defaults() {
        let call = ToolCall::parse(LIST_ACTIVE_IPOS, None).unwrap();
        assert_eq!(
            call,
            ToolCall::ListActiveIpos {
                industry: String::new(),
                page_index: 1,
                page_size: 20,
            }
        );
    }

    #[test]
    fn test_list_clamps_page_size() {
        let args = json!({"pageSize": 500, "pageIndex": 0, "industry": " 科技 "});
        let call = ToolCall::parse(LIST_ACTIVE_IPOS, Some(&args)).unwrap();
        assert_eq!(
            call,
            ToolCall::ListActiveIpos {
                industry: "科技".to_string(),
                page_index: 1,
                page_size: 100,
            }
        );

        let args = json!({"pageSize": 0});
        let Ok(ToolCall::ListActiveIpos { page_size, .. }) =
            ToolCall::parse(LIST_ACTIVE_IPOS, Some(&args))
        else {
            panic!("expected a list call");
        };
        assert_eq!(page_size, 1);
    }

    #[test]
    fn test_stock_code_string_and_number() {
        let call = ToolCall::parse(GET_IPO_DETAILS, Some(&json!({"stock_code": "6603"}))).unwrap();
        assert_eq!(
            call,
            ToolCall::GetIpoDetails {
                stock_code: "06603".to_string()
            }
        );

        let call = ToolCall::parse(GET_GREY_MARKET_DATA, Some(&json!({"stock_code": 2590}))).unwrap();
        assert_eq!(
            call,
            ToolCall::GetGreyMarketData {
                stock_code: "02590".to_string()
            }
        );
    }

    #[test]
    fn test_stock_code_missing() {
        for name in [GET_IPO_DETAILS, GET_ALLOCATION_INFO, GET_FIRST_DAY_PERFORMANCE] {
            assert_eq!(
                ToolCall::parse(name, Some(&json!({}))),
                Err(ToolArgsError::Missing("stock_code"))
            );
            assert_eq!(
                ToolCall::parse(name, Some(&json!({"stock_code": ""}))),
                Err(ToolArgsError::Missing("stock_code"))
            );
        }
    }

    #[test]
    fn test_stock_code_rejects_malformed() {
        for bad in [json!("ABCDE"), json!("123456"), json!("06-03"), json!(-5), json!(true)] {
            let result = ToolCall::parse(GET_IPO_DETAILS, Some(&json!({"stock_code": bad.clone()})));
            assert!(
                matches!(result, Err(ToolArgsError::Invalid { field: "stock_code", .. })),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_search_requires_name() {
        assert_eq!(
            ToolCall::parse(SEARCH_IPO_BY_NAME, Some(&json!({"exact_match": true}))),
            Err(ToolArgsError::Missing("company_name"))
        );

        let call = ToolCall::parse(
            SEARCH_IPO_BY_NAME,
            Some(&json!({"company_name": "IFBH", "exact_match": true})),
        )
        .unwrap();
        assert_eq!(
            call,
            ToolCall::SearchIpoByName {
                company_name: "IFBH".to_string(),
                exact_match: true,
            }
        );
    }

    #[test]
    fn test_overview_days_clamped() {
        let days = |args: Value| match ToolCall::parse(GET_MARKET_OVERVIEW, Some(&args)) {
            Ok(ToolCall::GetMarketOverview { days }) => days,
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(days(json!({})), 30);
        assert_eq!(days(json!({"days": 7})), 7);
        assert_eq!(days(json!({"days": 1000})), 365);
        assert_eq!(days(json!({"days": 0})), 1);
        assert_eq!(days(json!({"days": "14"})), 14);
    }

    #[test]
    fn test_unknown_tool_and_bad_shape() {
        assert_eq!(
            ToolCall::parse("hn_list_items", None),
            Err(ToolArgsError::UnknownTool("hn_list_items".to_string()))
        );
        assert_eq!(
            ToolCall::parse(GET_MARKET_OVERVIEW, Some(&json!([1, 2]))),
            Err(ToolArgsError::NotAnObject)
        );
    }

    #[test]
    fn test_name_round_trips_through_parse() {
        let call = ToolCall::parse(GET_ALLOCATION_INFO, Some(&json!({"stock_code": "0001"}))).unwrap();
        assert_eq!(call.name(), GET_ALLOCATION_INFO);
    }

    #[test]
    fn test_stock_code_needs_four_or_five_digits() {
        for short in [json!("1"), json!("700"), json!(700)] {
            let result = ToolCall::parse(GET_IPO_DETAILS, Some(&json!({"stock_code": short.clone()})));
            assert!(
                matches!(result, Err(ToolArgsError::Invalid { field: "stock_code", .. })),
                "{short}"
            );
        }

        assert_eq!(validate_stock_code("6603").unwrap(), "06603");
        assert_eq!(validate_stock_code(" 06603 ").unwrap(), "06603");
        assert_eq!(validate_stock_code("0700").unwrap(), "00700");
    }
}
