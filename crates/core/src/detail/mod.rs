//! Listing detail parsing
//!
//! The detail endpoint has answered with a structured JSON document for the
//! current site and with a rendered HTML page for the legacy one. Each format
//! has its own strategy; they are tried in order and the first one that
//! recognizes the body wins.

mod html;
mod json;

pub use html::parse_detail_html;
pub use json::{collect_underwriters, parse_brief_value, unwrap_brief};

use crate::normalize::normalize_stock_code;
use crate::types::IpoDetail;

/// Inputs shared by every strategy
#[derive(Debug, Clone, Copy)]
pub struct DetailContext<'a> {
    /// Code the caller asked for, used when the body does not carry one
    pub stock_code: &'a str,
    /// Fetch timestamp, used for sub-records without their own freshness stamp
    pub fetched_at: &'a str,
}

type Strategy = fn(&str, &DetailContext<'_>) -> Option<IpoDetail>;

const STRATEGIES: &[(&str, Strategy)] = &[("json", json::parse), ("html", html::parse)];

/// Outcome of [`parse_ipo_detail`], naming the strategy that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDetail {
    pub detail: IpoDetail,
    /// `None` when no strategy recognized the body
    pub strategy: Option<&'static str>,
}

/// Parse a raw detail body
///
/// Never fails. When nothing matches, the record carries only the requested
/// code and `status = "unknown"`.
pub fn parse_ipo_detail(body: &str, ctx: &DetailContext<'_>) -> ParsedDetail {
    STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            strategy(body, ctx).map(|detail| ParsedDetail {
                detail,
                strategy: Some(*name),
            })
        })
        .unwrap_or_else(|| ParsedDetail {
            detail: IpoDetail::unknown(&normalize_stock_code(ctx.stock_code)),
            strategy: None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: DetailContext<'static> = DetailContext {
        stock_code: "6603",
        fetched_at: "2025-06-29T10:00:00Z",
    };

    #[test]
    fn test_json_body_end_to_end() {
        let body = r#"{"result":1,"data":{"issuanceinfo":{"ipopricing":"18.8","name":"IFBH"}}}"#;
        let parsed = parse_ipo_detail(body, &CTX);

        assert_eq!(parsed.strategy, Some("json"));
        assert_eq!(parsed.detail.info.stock_code, "06603");
        assert_eq!(parsed.detail.info.stock_name, "IFBH");
        assert_eq!(parsed.detail.info.price_range, "18.8港元");
        assert_eq!(parsed.detail.info.status, "active");
    }

    #[test]
    fn test_status_msg_does_not_hide_document() {
        let body = r#"{"result":1,"msg":"success","data":{"issuanceinfo":{"name":"IFBH","shares":"500"}}}"#;
        let parsed = parse_ipo_detail(body, &CTX);

        assert_eq!(parsed.strategy, Some("json"));
        assert_eq!(parsed.detail.info.stock_name, "IFBH");
        assert_eq!(parsed.detail.info.lot_size, 500);
        assert_eq!(parsed.detail.info.status, "active");
    }

    #[test]
    fn test_missing_issuance_is_unknown() {
        let parsed = parse_ipo_detail(r#"{"result":1,"data":{}}"#, &CTX);

        assert_eq!(parsed.strategy, None);
        assert_eq!(parsed.detail.info.stock_code, "06603");
        assert_eq!(parsed.detail.info.status, "unknown");
        assert_eq!(parsed.detail.info.lot_size, 0);
        assert_eq!(parsed.detail.info.price_range, "");
        assert!(parsed.detail.company_info.management.is_empty());
    }

    #[test]
    fn test_html_body_uses_html_strategy() {
        let body = "<html><head><title>IFBH - 新股详情</title></head><body></body></html>";
        let parsed = parse_ipo_detail(body, &CTX);

        assert_eq!(parsed.strategy, Some("html"));
        assert_eq!(parsed.detail.info.stock_name, "IFBH");
    }

    #[test]
    fn test_garbage_is_unknown() {
        for body in ["", "   ", "not a document", "{broken"] {
            let parsed = parse_ipo_detail(body, &CTX);
            assert_eq!(parsed.detail.info.status, "unknown", "body: {body:?}");
        }
    }
}
