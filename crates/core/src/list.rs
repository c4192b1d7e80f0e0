//! Active IPO list parsing

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use crate::normalize::{
    format_period, format_price_range, normalize_date, normalize_stock_code, parse_leading_number,
};
use crate::types::{IpoInfo, PaginatedResponse};
use crate::value::{field_array, field_count, field_number, field_text, is_success};

/// Status tag for listings reported by the active list
pub const STATUS_ACTIVE: &str = "active";

/// Minimum number of cells for a row of the legacy HTML table
const HTML_ROW_MIN_CELLS: usize = 10;

/// Parse a raw list response body
///
/// JSON bodies go through the envelope parser; anything else is treated as the
/// legacy HTML table. Never fails: unusable input is an empty page.
pub fn parse_ipo_list(body: &str, page_index: u64, page_size: u64) -> PaginatedResponse<IpoInfo> {
    match serde_json::from_str::<Value>(body) {
        Ok(envelope) => parse_ipo_list_json(&envelope, page_index, page_size),
        Err(_) => parse_ipo_list_html(body, page_index)
            .unwrap_or_else(|| PaginatedResponse::empty(page_index, page_size)),
    }
}

/// Parse the `{result, data: {dataList, totalRows}}` envelope
pub fn parse_ipo_list_json(
    envelope: &Value,
    page_index: u64,
    page_size: u64,
) -> PaginatedResponse<IpoInfo> {
    if !is_success(envelope) {
        return PaginatedResponse::empty(page_index, page_size);
    }

    let Some(data) = envelope.get("data").filter(|d| d.is_object()) else {
        return PaginatedResponse::empty(page_index, page_size);
    };

    if !data.get("dataList").is_some_and(Value::is_array) {
        return PaginatedResponse::empty(page_index, page_size);
    }

    let items: Vec<IpoInfo> = field_array(data, "dataList")
        .iter()
        .map(ipo_info_from_row)
        .collect();

    let total_count = field_count(data, "totalRows");
    build_page(items, total_count, page_index, page_size)
}

/// Map one upstream list row into an [`IpoInfo`]
pub fn ipo_info_from_row(row: &Value) -> IpoInfo {
    let symbol = field_text(row, "symbol");

    IpoInfo {
        stock_code: if symbol.is_empty() {
            symbol
        } else {
            normalize_stock_code(&symbol)
        },
        stock_name: field_text(row, "shortName"),
        listing_date: normalize_date(&field_text(row, "listedDate")),
        sponsor: field_text(row, "sponsors"),
        price_range: format_price_range(
            field_number(row, "price_Floor"),
            field_number(row, "price_Ceiling"),
        ),
        lot_size: field_count(row, "shares"),
        subscription_period: format_period(
            &field_text(row, "startdate"),
            &field_text(row, "enddate"),
        ),
        market_cap: field_number(row, "marketcap"),
        pe_ratio: field_number(row, "pe"),
        result_date: normalize_date(&field_text(row, "resultDate")),
        industry: field_text(row, "industry"),
        status: STATUS_ACTIVE.to_string(),
    }
}

/// Parse the legacy HTML listing table, one row per listing
///
/// Returns `None` when the document has no usable rows.
pub fn parse_ipo_list_html(html: &str, page_index: u64) -> Option<PaginatedResponse<IpoInfo>> {
    let document = Html::parse_document(html);
    let row_selector = Selector::parse("table tbody tr").ok()?;
    let cell_selector = Selector::parse("td").ok()?;

    let items: Vec<IpoInfo> = document
        .select(&row_selector)
        .filter_map(|row| {
            let cells: Vec<String> = row.select(&cell_selector).map(cell_text).collect();
            ipo_info_from_cells(&cells)
        })
        .collect();

    if items.is_empty() {
        return None;
    }

    let count = items.len() as u64;
    Some(PaginatedResponse {
        items,
        total_count: count,
        page_index,
        page_size: count,
        total_pages: 1,
    })
}

fn ipo_info_from_cells(cells: &[String]) -> Option<IpoInfo> {
    if cells.len() < HTML_ROW_MIN_CELLS {
        return None;
    }

    let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
    let cell_number = |i: usize| parse_leading_number(&cell(i)).unwrap_or(0.0);

    let code = cell(0);

    Some(IpoInfo {
        stock_code: if code.is_empty() {
            code
        } else {
            normalize_stock_code(&code)
        },
        stock_name: cell(1),
        listing_date: normalize_date(&cell(2)),
        sponsor: cell(3),
        price_range: cell(4),
        lot_size: parse_leading_number(&cell(5))
            .filter(|n| *n > 0.0)
            .map(|n| n.trunc() as u64)
            .unwrap_or(0),
        subscription_period: cell(6),
        market_cap: cell_number(7),
        pe_ratio: cell_number(8),
        result_date: normalize_date(&cell(9)),
        industry: cell(10),
        status: STATUS_ACTIVE.to_string(),
    })
}

pub(crate) fn cell_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn build_page(
    items: Vec<IpoInfo>,
    total_count: u64,
    page_index: u64,
    requested_size: u64,
) -> PaginatedResponse<IpoInfo> {
    let page_size = if items.is_empty() {
        requested_size
    } else {
        items.len() as u64
    };
    let total_pages = total_count.div_ceil(page_size.max(1));

    PaginatedResponse {
        items,
        total_count,
        page_index,
        page_size,
        total_pages,
    }
}
