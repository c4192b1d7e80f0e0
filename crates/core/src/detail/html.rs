//! Legacy rendered detail pages
//!
//! Values live in two places: inline `<script>` variables and labelled table
//! cells. Script variables are read first; the DOM lookups fill in what the
//! scripts do not carry.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::DetailContext;
use crate::list::{cell_text, STATUS_ACTIVE};
use crate::normalize::{
    format_period, format_price_range, normalize_date, normalize_stock_code, parse_amount,
    parse_leading_number,
};
use crate::placing::allocation_level_from_tuple;
use crate::types::{
    CompanyInfo, FirstDayPerformance, GreyMarketData, IpoDetail, IpoInfo, PlacingResult,
};

const GREY_MARKET_SELECTOR: &str = "#tbInnerDisk, #tbOutDisk, .dark_";
const PLACING_SELECTOR: &str = "#tbPlacingResultDetail, .placing_result";
const FIRST_DAY_SELECTOR: &str = "#tbGreyFirstData, .first_day_performance";
const NAME_SELECTOR: &str = ".stock_name, .company-name, h1, h2";

/// Placing rows shorter than this are headers or notes
const PLACING_ROW_MIN_CELLS: usize = 5;

type LabelLookup = fn(ElementRef<'_>, &str) -> Option<String>;

/// Label/value layouts seen on the legacy pages, most specific first
const LABEL_LOOKUPS: &[LabelLookup] = &[
    cell_after_cell,
    value_after_label,
    span_after_span,
    value_inside_div,
    cell_after_header,
];

pub(super) fn parse(body: &str, ctx: &DetailContext<'_>) -> Option<IpoDetail> {
    let trimmed = body.trim_start();
    if trimmed.is_empty() || trimmed.starts_with(['{', '[']) || !trimmed.contains('<') {
        return None;
    }
    Some(parse_detail_html(body, ctx))
}

/// Scrape a rendered detail page
pub fn parse_detail_html(html: &str, ctx: &DetailContext<'_>) -> IpoDetail {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let script = script_text(&document);
    let stock_code = normalize_stock_code(ctx.stock_code);

    let price_range = match (
        script_number(&script, "price_Floor"),
        script_number(&script, "price_Ceiling"),
    ) {
        (Some(floor), Some(ceiling)) => format_price_range(floor, ceiling),
        _ => first_label_value(root, &["招股价", "价格"]),
    };

    let subscription_period = match (
        script_string(&script, "startdate"),
        script_string(&script, "enddate"),
    ) {
        (Some(start), Some(end)) => format_period(&start, &end),
        _ => first_label_value(root, &["招股日期", "申购期间"]),
    };

    let info = IpoInfo {
        stock_code: stock_code.clone(),
        stock_name: stock_name(&document, &script),
        listing_date: script_date(&script, "listedDate"),
        sponsor: label_value(root, "保荐人"),
        price_range,
        lot_size: script_number(&script, "shares")
            .filter(|n| *n > 0.0)
            .map(|n| n.trunc() as u64)
            .unwrap_or(0),
        subscription_period,
        market_cap: script_number(&script, "marketcap").unwrap_or(0.0),
        pe_ratio: script_number(&script, "pe").unwrap_or(0.0),
        result_date: script_date(&script, "resultDate"),
        industry: script_string(&script, "industry").unwrap_or_default(),
        status: STATUS_ACTIVE.to_string(),
    };

    let grey_market = grey_market(&document, &info, ctx.fetched_at);
    let placing_result = placing_result(&document, &info);
    let first_day_performance = first_day_performance(&document, &info);

    IpoDetail {
        company_info: CompanyInfo {
            business: label_value(root, "主营业务"),
            ..CompanyInfo::default()
        },
        info,
        grey_market,
        first_day_performance,
        placing_result,
    }
}

fn script_text(document: &Html) -> String {
    let Ok(selector) = Selector::parse("script") else {
        return String::new();
    };
    document
        .select(&selector)
        .map(|script| script.text().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Script variables read from the legacy pages
const SCRIPT_FIELDS: &[&str] = &[
    "stockCode",
    "price_Floor",
    "price_Ceiling",
    "shares",
    "marketcap",
    "pe",
    "industry",
    "listedDate",
    "resultDate",
    "startdate",
    "enddate",
];

/// Compiled lookups for one script field
struct FieldPatterns {
    /// `field = 1.5`, `"field": 1.5` or `'field': 1.5`
    number: Vec<Regex>,
    /// `field = "text"`, `"field": "text"` or `'field': 'text'`
    string: Vec<Regex>,
}

impl FieldPatterns {
    fn new(field: &str) -> Self {
        let field = regex::escape(field);
        let compile = |patterns: [String; 3]| -> Vec<Regex> {
            patterns
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect()
        };

        Self {
            number: compile([
                format!(r"(?i)\b{field}\s*[:=]\s*([\d.]+)"),
                format!(r#"(?i)"{field}"\s*:\s*([\d.]+)"#),
                format!(r"(?i)'{field}'\s*:\s*([\d.]+)"),
            ]),
            string: compile([
                format!(r#"(?i)\b{field}\s*[:=]\s*['"]([^'"]+)['"]"#),
                format!(r#"(?i)"{field}"\s*:\s*"([^"]+)""#),
                format!(r"(?i)'{field}'\s*:\s*'([^']+)'"),
            ]),
        }
    }
}

fn field_patterns(field: &str) -> Option<&'static FieldPatterns> {
    static PATTERNS: OnceLock<HashMap<&'static str, FieldPatterns>> = OnceLock::new();
    PATTERNS
        .get_or_init(|| {
            SCRIPT_FIELDS
                .iter()
                .map(|field| (*field, FieldPatterns::new(field)))
                .collect()
        })
        .get(field)
}

fn first_capture(haystack: &str, patterns: &[Regex]) -> Option<String> {
    patterns.iter().find_map(|re| {
        re.captures(haystack)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    })
}

fn script_number(script: &str, field: &str) -> Option<f64> {
    let patterns = field_patterns(field)?;
    first_capture(script, &patterns.number).and_then(|raw| parse_leading_number(&raw))
}

fn script_string(script: &str, field: &str) -> Option<String> {
    let patterns = field_patterns(field)?;
    first_capture(script, &patterns.string).map(|raw| raw.trim().to_string())
}

fn script_date(script: &str, field: &str) -> String {
    script_string(script, field)
        .map(|raw| normalize_date(&raw))
        .unwrap_or_default()
}

fn stock_name(document: &Html, script: &str) -> String {
    if script_string(script, "stockCode").is_some() {
        if let Ok(selector) = Selector::parse(NAME_SELECTOR) {
            if let Some(name) = document
                .select(&selector)
                .map(cell_text)
                .find(|name| !name.is_empty())
            {
                return name;
            }
        }
    }

    let Ok(title) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&title)
        .next()
        .map(cell_text)
        .and_then(|title| title.split('-').next().map(|s| s.trim().to_string()))
        .unwrap_or_default()
}

/// Text of the value paired with `label`, or an empty string
fn label_value(root: ElementRef<'_>, label: &str) -> String {
    LABEL_LOOKUPS
        .iter()
        .find_map(|lookup| lookup(root, label))
        .unwrap_or_default()
}

fn first_label_value(root: ElementRef<'_>, labels: &[&str]) -> String {
    labels
        .iter()
        .map(|label| label_value(root, label))
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

/// First non-empty element directly following an element that mentions `label`
fn next_sibling_text(
    root: ElementRef<'_>,
    label_selector: &str,
    label: &str,
    accept: fn(&ElementRef<'_>) -> bool,
) -> Option<String> {
    let selector = Selector::parse(label_selector).ok()?;
    root.select(&selector)
        .filter(|element| cell_text(*element).contains(label))
        .filter_map(|element| element.next_siblings().find_map(ElementRef::wrap))
        .filter(|sibling| accept(sibling))
        .map(cell_text)
        .find(|text| !text.is_empty())
}

fn is_tag(element: &ElementRef<'_>, name: &str) -> bool {
    element.value().name().eq_ignore_ascii_case(name)
}

fn has_value_class(element: &ElementRef<'_>) -> bool {
    element.value().classes().any(|class| class == "value")
}

fn cell_after_cell(root: ElementRef<'_>, label: &str) -> Option<String> {
    next_sibling_text(root, "td", label, |e| is_tag(e, "td"))
}

fn value_after_label(root: ElementRef<'_>, label: &str) -> Option<String> {
    next_sibling_text(root, ".label", label, has_value_class)
}

fn span_after_span(root: ElementRef<'_>, label: &str) -> Option<String> {
    next_sibling_text(root, "span", label, |e| is_tag(e, "span"))
}

fn cell_after_header(root: ElementRef<'_>, label: &str) -> Option<String> {
    next_sibling_text(root, "th", label, |e| is_tag(e, "td"))
}

/// `.value` inside the innermost `div` mentioning `label`
fn value_inside_div(root: ElementRef<'_>, label: &str) -> Option<String> {
    let div = Selector::parse("div").ok()?;
    let value = Selector::parse(".value").ok()?;

    let containers: Vec<ElementRef<'_>> = root
        .select(&div)
        .filter(|element| cell_text(*element).contains(label))
        .collect();

    containers.iter().rev().find_map(|container| {
        container
            .select(&value)
            .map(cell_text)
            .find(|text| !text.is_empty())
    })
}

fn grey_market(document: &Html, info: &IpoInfo, fetched_at: &str) -> Option<GreyMarketData> {
    let selector = Selector::parse(GREY_MARKET_SELECTOR).ok()?;
    document.select(&selector).next()?;

    Some(GreyMarketData {
        stock_code: info.stock_code.clone(),
        short_name: info.stock_name.clone(),
        listing_date: info.listing_date.clone(),
        result_date: info.result_date.clone(),
        last_updated: fetched_at.to_string(),
        ..GreyMarketData::default()
    })
}

fn placing_result(document: &Html, info: &IpoInfo) -> Option<PlacingResult> {
    let tables = Selector::parse(PLACING_SELECTOR).ok()?;
    let rows = Selector::parse("tr").ok()?;
    let cells = Selector::parse("td").ok()?;

    let mut found = false;
    let mut allocation_list = Vec::new();
    for table in document.select(&tables) {
        found = true;
        for row in table.select(&rows) {
            let tuple: Vec<Value> = row
                .select(&cells)
                .map(|cell| Value::String(cell_text(cell)))
                .collect();
            if tuple.len() >= PLACING_ROW_MIN_CELLS {
                allocation_list.push(allocation_level_from_tuple(&tuple));
            }
        }
    }

    found.then(|| PlacingResult {
        stock_code: info.stock_code.clone(),
        stock_name: info.stock_name.clone(),
        lot_size: info.lot_size as f64,
        allocation_list,
        ..PlacingResult::default()
    })
}

fn first_day_performance(document: &Html, info: &IpoInfo) -> Option<FirstDayPerformance> {
    let selector = Selector::parse(FIRST_DAY_SELECTOR).ok()?;
    let section = document.select(&selector).next()?;
    let figure = |label: &str| parse_amount(&label_value(section, label));

    Some(FirstDayPerformance {
        stock_code: info.stock_code.clone(),
        open_price: figure("开盘价"),
        high_price: figure("最高价"),
        low_price: figure("最低价"),
        close_price: figure("收盘价"),
        change_percent: figure("涨跌幅"),
        volume: figure("成交量"),
        turnover_rate: figure("换手率"),
        market_cap: figure("市值"),
        listing_date: info.listing_date.clone(),
    })
}
