//! `NewStockBrief` JSON documents

use std::borrow::Cow;

use serde_json::Value;

use super::DetailContext;
use crate::list::STATUS_ACTIVE;
use crate::normalize::{
    format_period, format_price_range, normalize_date, normalize_stock_code, PRICE_SUFFIX,
};
use crate::types::{CompanyInfo, CornerstoneInvestor, IpoDetail, IpoInfo, ManagementInfo};
use crate::value::{
    amount, field_amount, field_array, field_count, field_number, field_text, first_amount,
    first_text, number,
};

pub(super) fn parse(body: &str, ctx: &DetailContext<'_>) -> Option<IpoDetail> {
    let envelope: Value = serde_json::from_str(body).ok()?;
    let document = unwrap_brief(&envelope);
    parse_brief_value(&document, ctx.stock_code)
}

/// Peel the `msg` wrapper off a detail envelope
///
/// `msg` may hold the document as a JSON-encoded string or as an object. Any
/// other `msg` (absent, empty, a status word like `"success"`) leaves the
/// envelope itself as the document.
pub fn unwrap_brief(envelope: &Value) -> Cow<'_, Value> {
    match envelope.get("msg") {
        Some(Value::String(msg)) => match serde_json::from_str::<Value>(msg.trim()) {
            Ok(document @ Value::Object(_)) => Cow::Owned(document),
            _ => Cow::Borrowed(envelope),
        },
        Some(msg @ Value::Object(_)) => Cow::Borrowed(msg),
        _ => Cow::Borrowed(envelope),
    }
}

/// Map a decoded brief document
///
/// Returns `None` unless `data.issuanceinfo` is an object.
pub fn parse_brief_value(document: &Value, stock_code: &str) -> Option<IpoDetail> {
    let data = document.get("data")?;
    let issuance = data.get("issuanceinfo").filter(|v| v.is_object())?;
    let institution = data.get("institutioninfo").unwrap_or(&Value::Null);

    let sponsors = field_text(issuance, "sponsors");
    let lead_agent = field_text(issuance, "leadagent");
    let book_runners = field_text(issuance, "bookrunners");
    let hk_market_cap = first_amount(issuance, &["H_marketcap_units", "H_marketcap"]);

    let info = IpoInfo {
        stock_code: normalize_stock_code(stock_code),
        stock_name: first_text(issuance, &["name", "fullname"]),
        listing_date: date_or_period(issuance.get("listeddate")),
        sponsor: sponsors.clone(),
        price_range: price_range(issuance),
        lot_size: field_count(issuance, "shares"),
        subscription_period: date_or_period(issuance.get("ipodate")),
        market_cap: hk_market_cap,
        pe_ratio: field_number(issuance, "pe"),
        result_date: date_or_period(issuance.get("resultdate")),
        industry: field_text(issuance, "industry"),
        status: STATUS_ACTIVE.to_string(),
    };

    let company_info = CompanyInfo {
        business: field_text(institution, "principalactivities"),
        total_shares: field_amount(issuance, "IssuedCapital"),
        public_offering: first_amount(issuance, &["issuenumberhk_units", "issuenumberhK"]),
        international_offering: first_amount(
            issuance,
            &["issuenumberother_units", "issuenumberother"],
        ),

        full_name: field_text(issuance, "fullname"),
        website: field_text(institution, "website"),
        principal_office: field_text(institution, "principaloffice"),
        registrars: field_text(institution, "registrars"),
        registrars_tel: field_text(institution, "registrarstel"),
        chairman: field_text(institution, "chairman"),
        secretary: field_text(institution, "secretary"),
        telephone: field_text(institution, "telephone"),
        substantial_shareholders: field_text(institution, "substantialshareholders"),

        minimum_capital: field_amount(issuance, "minimumcapital"),
        raise_money: first_amount(issuance, &["raisemoney_units", "raisemoney"]),
        total_market_cap: first_amount(issuance, &["marketcap_units", "marketcap"]),
        hk_market_cap,
        issue_ratio: field_number(issuance, "IssueRatio"),
        over_allotment: field_text(issuance, "OverAllotment"),
        stabilizing_manager: field_text(issuance, "StabilizingManager"),
        underwriting_fee: field_number(issuance, "underwritingFee"),
        listing_expenses: field_number(issuance, "listingexpenses"),
        currency: field_text(issuance, "Currency"),

        use_of_proceeds: field_text(issuance, "use"),

        all_underwriters: collect_underwriters(&sponsors, &lead_agent, &book_runners),
        lead_agent,
        book_runners,
        coordinator: field_text(issuance, "coordinator"),

        prospectus_link: field_text(issuance, "link"),

        is_ah_stock: is_flag_set(issuance.get("isAHStock")),
        a_symbol: field_text(issuance, "aSymbol"),

        management: field_array(data, "managerinfo")
            .iter()
            .map(|manager| ManagementInfo {
                name: field_text(manager, "managername"),
                position: field_text(manager, "post"),
                rank: field_count(manager, "rankno"),
            })
            .collect(),
        corner_stone_investors: field_array(data, "investorinfo")
            .iter()
            .map(|investor| CornerstoneInvestor {
                name: field_text(investor, "institutionname"),
                shareholding: field_amount(investor, "shareholding"),
                percentage: field_number(investor, "percentage"),
                release_date: date_or_period(investor.get("ReleaseDate")),
                related_party: field_text(investor, "relatedparty"),
                investor_type: field_text(investor, "InverstorType"),
                investment_amount: field_amount(investor, "investmentAmount"),
            })
            .collect(),
        total_corner_stone_percentage: field_number(data, "TotalShareholdingPercentage"),
    };

    Some(IpoDetail {
        info,
        company_info,
        ..IpoDetail::default()
    })
}

/// Sponsors, then lead agents, then bookrunners, each name kept once
pub fn collect_underwriters(sponsors: &str, lead_agents: &str, book_runners: &str) -> Vec<String> {
    let names = std::iter::once(sponsors)
        .chain(lead_agents.split([',', '，']))
        .chain(book_runners.split([',', '，']))
        .map(str::trim)
        .filter(|name| !name.is_empty());

    let mut underwriters: Vec<String> = Vec::new();
    for name in names {
        if !underwriters.iter().any(|seen| seen == name) {
            underwriters.push(name.to_string());
        }
    }
    underwriters
}

fn price_range(issuance: &Value) -> String {
    let pricing = field_text(issuance, "ipopricing");
    if !pricing.is_empty() && pricing != "--" {
        return format!("{pricing}{PRICE_SUFFIX}");
    }

    match issuance.get("ipoprice") {
        Some(price) => format_price_range(amount_at(price, "floor"), amount_at(price, "ceiling")),
        None => String::new(),
    }
}

fn amount_at(object: &Value, key: &str) -> f64 {
    object.get(key).map(amount).unwrap_or(0.0)
}

/// A date string, or a `{start, end}` pair rendered as a period
fn date_or_period(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => normalize_date(s),
        Some(range @ Value::Object(_)) => {
            format_period(&field_text(range, "start"), &field_text(range, "end"))
        }
        _ => String::new(),
    }
}

fn is_flag_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(flag)) => *flag,
        Some(v @ Value::Number(_)) => number(v) == 1.0,
        _ => false,
    }
}
