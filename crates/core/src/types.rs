//! Domain records returned by every parser.
//!
//! All records serialize with camelCase keys. Scalar fields are never null:
//! missing or unparsable upstream values become `0` or `""`. Only the nested
//! sub-records of [`IpoDetail`] (and a couple of explicitly nullable fields)
//! may be absent.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single listing as returned by the active-IPO list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpoInfo {
    pub stock_code: String,
    pub stock_name: String,
    pub listing_date: String,
    pub sponsor: String,
    pub price_range: String,
    pub lot_size: u64,
    pub subscription_period: String,
    pub market_cap: f64,
    pub pe_ratio: f64,
    pub result_date: String,
    pub industry: String,
    pub status: String,
}

/// Member of the management roster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementInfo {
    pub name: String,
    pub position: String,
    pub rank: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CornerstoneInvestor {
    pub name: String,
    pub shareholding: f64,
    pub percentage: f64,
    pub release_date: String,
    pub related_party: String,
    pub investor_type: String,
    pub investment_amount: f64,
}

/// Extended company and offering information attached to a detail record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub business: String,
    pub total_shares: f64,
    pub public_offering: f64,
    pub international_offering: f64,

    pub full_name: String,
    pub website: String,
    pub principal_office: String,
    pub registrars: String,
    pub registrars_tel: String,
    pub chairman: String,
    pub secretary: String,
    pub telephone: String,
    pub substantial_shareholders: String,

    pub minimum_capital: f64,
    pub raise_money: f64,
    pub total_market_cap: f64,
    pub hk_market_cap: f64,
    pub issue_ratio: f64,
    pub over_allotment: String,
    pub stabilizing_manager: String,
    pub underwriting_fee: f64,
    pub listing_expenses: f64,
    pub currency: String,

    pub use_of_proceeds: String,

    /// Sponsors, lead agents and bookrunners, de-duplicated in order of first appearance
    pub all_underwriters: Vec<String>,
    pub lead_agent: String,
    pub book_runners: String,
    pub coordinator: String,

    pub prospectus_link: String,

    #[serde(rename = "isAHStock")]
    pub is_ah_stock: bool,
    pub a_symbol: String,

    pub management: Vec<ManagementInfo>,
    pub corner_stone_investors: Vec<CornerstoneInvestor>,
    pub total_corner_stone_percentage: f64,
}

/// Full detail for a single listing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpoDetail {
    #[serde(flatten)]
    pub info: IpoInfo,
    pub company_info: CompanyInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grey_market: Option<GreyMarketData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_day_performance: Option<FirstDayPerformance>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placing_result: Option<PlacingResult>,
}

impl IpoDetail {
    /// Detail record used when nothing could be parsed at all
    pub fn unknown(stock_code: &str) -> Self {
        Self {
            info: IpoInfo {
                stock_code: stock_code.to_string(),
                status: "unknown".to_string(),
                ..IpoInfo::default()
            },
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrokerQuote {
    pub broker_name: String,
    pub bid_price: f64,
    pub ask_price: f64,
    pub spread: f64,
}

/// Unofficial pre-listing trading quote
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GreyMarketData {
    pub stock_code: String,
    pub short_name: String,
    pub current_price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub turnover: f64,
    pub ipo_pricing: f64,
    pub listing_date: String,
    pub result_date: String,
    pub broker_quotes: Vec<BrokerQuote>,
    pub last_updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirstDayPerformance {
    pub stock_code: String,
    pub open_price: f64,
    pub high_price: f64,
    pub low_price: f64,
    pub close_price: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub turnover_rate: f64,
    pub market_cap: f64,
    pub listing_date: String,
}

/// One application-size tier of a placing result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLevel {
    pub shares: u64,
    pub applicants: u64,
    /// `None` when upstream did not report it; `Some(0)` is a real outcome
    pub successful_applicants: Option<u64>,
    pub winning_rate: f64,
    pub allocation_details: String,
    pub is_placee: i64,
    pub amount: f64,
}

/// Allocation statistics published after the subscription closes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacingResult {
    pub stock_code: String,
    pub stock_name: String,
    pub lot_size: f64,
    pub total_shares: f64,
    pub allocation_rate: f64,
    pub claw_back: f64,
    pub subscribed: f64,
    /// Subscription multiple
    pub placement_times: f64,
    pub codes_rate: f64,
    pub head_hammer: f64,
    pub price_ceiling: f64,
    pub price_floor: f64,
    pub ipo_pricing: f64,
    pub raise_money: f64,
    pub invalid_application: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_result_url: Option<String>,
    pub allocation_list: Vec<AllocationLevel>,
}

/// One page of results, always derived from the most recent upstream page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page_index: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn empty(page_index: u64, page_size: u64) -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
            page_index,
            page_size,
            total_pages: 0,
        }
    }
}

/// Result of a client-side name search
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOutput {
    pub keyword: String,
    pub exact_match: bool,
    pub matched_count: usize,
    pub items: Vec<IpoInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewStatistics {
    #[serde(rename = "activeIPOs")]
    pub active_ipos: usize,
    #[serde(rename = "avgMarketCap")]
    pub avg_market_cap: f64,
    #[serde(rename = "avgPERatio")]
    pub avg_pe_ratio: f64,
    pub industries: BTreeMap<String, usize>,
}

/// Aggregate statistics over the most recently fetched page of listings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketOverview {
    #[serde(rename = "totalIPOs")]
    pub total_ipos: usize,
    pub period: String,
    pub statistics: OverviewStatistics,
    #[serde(rename = "lastUpdated")]
    pub last_updated: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_flattens_info_and_omits_absent_records() {
        let detail = IpoDetail::unknown("06603");
        let json = serde_json::to_value(&detail).unwrap();

        assert_eq!(json["stockCode"], "06603");
        assert_eq!(json["status"], "unknown");
        assert_eq!(json["lotSize"], 0);
        assert!(json.get("companyInfo").is_some());
        assert!(json.get("greyMarket").is_none());
        assert!(json.get("placingResult").is_none());
        assert!(json.get("firstDayPerformance").is_none());
    }

    #[test]
    fn test_company_info_ah_flag_key() {
        let json = serde_json::to_value(CompanyInfo::default()).unwrap();
        assert_eq!(json["isAHStock"], false);
        assert!(json["allUnderwriters"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_successful_applicants_serializes_null() {
        let level = AllocationLevel::default();
        let json = serde_json::to_value(&level).unwrap();
        assert!(json["successfulApplicants"].is_null());
    }

    #[test]
    fn test_empty_page() {
        let page: PaginatedResponse<IpoInfo> = PaginatedResponse::empty(1, 20);
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json["items"], serde_json::json!([]));
        assert_eq!(json["totalCount"], 0);
        assert_eq!(json["totalPages"], 0);
    }
}
