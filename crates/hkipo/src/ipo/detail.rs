use crate::prelude::{print, println, *};
use colored::Colorize;
use hkipo_core::args::validate_stock_code;
use hkipo_core::detail::{parse_ipo_detail, DetailContext};
use hkipo_core::format::{format_detail, group_thousands};
use hkipo_core::grey::parse_grey_list;
use hkipo_core::normalize::{detail_code_param, normalize_stock_code};
use hkipo_core::placing::parse_placing_result;
use hkipo_core::types::{FirstDayPerformance, GreyMarketData, IpoDetail, PlacingResult};
use serde_json::{json, Value};

use super::{cell, now_timestamp, print_json};
use crate::client::{Clients, GREY_LIST_PATH, IPO_DETAIL_PATH, PLACING_RESULT_PATH};

/// Ask the placing endpoint for every tier
const ALL_TIERS: i64 = -1;
const PLACING_LANG: &str = "zh_CN";

#[derive(Debug, clap::Args, Clone)]
pub struct CodeOptions {
    /// Stock code, with or without leading zeros (e.g. 6603 or 06603)
    #[arg(value_name = "CODE")]
    pub stock_code: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl CodeOptions {
    fn code(&self) -> Result<String> {
        validate_stock_code(&self.stock_code).map_err(|e| eyre!("{e}"))
    }
}

/// Fetch and parse the detail record of a listing
///
/// Transport failures and unrecognized bodies yield an `unknown` record.
pub async fn detail_data(clients: &Clients, stock_code: &str) -> IpoDetail {
    let code = normalize_stock_code(stock_code);
    let query = [("code", detail_code_param(&code))];

    let body = match clients.aipo.get(IPO_DETAIL_PATH, &query).await {
        Ok(body) => body,
        Err(e) => {
            log::error!("Failed to fetch detail for {code}: {e}");
            return IpoDetail::unknown(&code);
        }
    };

    let fetched_at = now_timestamp();
    let ctx = DetailContext {
        stock_code: &code,
        fetched_at: &fetched_at,
    };
    let parsed = parse_ipo_detail(&body, &ctx);

    match parsed.strategy {
        Some(strategy) => log::debug!("Detail for {code} parsed as {strategy}"),
        None => log::warn!("Detail for {code} not recognized, returning unknown record"),
    }

    parsed.detail
}

/// Grey-market quote from the grey list, falling back to the detail page
pub async fn grey_data(clients: &Clients, stock_code: &str) -> Option<GreyMarketData> {
    let code = normalize_stock_code(stock_code);

    match clients
        .aipo
        .get(GREY_LIST_PATH, &[("symbol", code.clone())])
        .await
    {
        Ok(body) => {
            if let Some(grey) = parse_grey_list(&body, &code, &now_timestamp()) {
                return Some(grey);
            }
            log::debug!("Grey list has no row for {code}, trying the detail page");
        }
        Err(e) => log::warn!("Failed to fetch grey list for {code}: {e}"),
    }

    detail_data(clients, &code).await.grey_market
}

/// Placing result from the placing host, falling back to the detail page
pub async fn placing_data(clients: &Clients, stock_code: &str) -> Option<PlacingResult> {
    let code = normalize_stock_code(stock_code);
    let (query, body) = placing_request(&code);

    match clients.jyb.post_json(PLACING_RESULT_PATH, &query, &body).await {
        Ok(response) => {
            if let Some(result) = parse_placing_result(&response, &code) {
                return Some(result);
            }
            log::debug!("No placing result for {code}, trying the detail page");
        }
        Err(e) => log::warn!("Failed to fetch placing result for {code}: {e}"),
    }

    detail_data(clients, &code).await.placing_result
}

/// Query and JSON body of the placing-result POST
fn placing_request(code: &str) -> ([(&'static str, String); 1], Value) {
    (
        [("lang", PLACING_LANG.to_string())],
        json!({ "symbol": code, "count": ALL_TIERS }),
    )
}

pub async fn first_day_data(clients: &Clients, stock_code: &str) -> Option<FirstDayPerformance> {
    detail_data(clients, stock_code).await.first_day_performance
}

pub async fn run_detail(options: CodeOptions, clients: &Clients) -> Result<()> {
    let detail = detail_data(clients, &options.code()?).await;

    if options.json {
        return print_json(&detail);
    }

    if detail.info.status == "unknown" {
        println!(
            "\n{}",
            format!("No detail available for {}", detail.info.stock_code).yellow()
        );
        return Ok(());
    }

    print!("{}", format_detail(&detail));
    Ok(())
}

pub async fn run_grey(options: CodeOptions, clients: &Clients) -> Result<()> {
    let code = options.code()?;
    let grey = grey_data(clients, &code).await;

    if options.json {
        return print_json(&grey);
    }

    let Some(grey) = grey else {
        println!("\n{}", format!("No grey market data for {code}").yellow());
        return Ok(());
    };

    println!(
        "\n{} {}\n",
        "GREY MARKET".bright_cyan().bold(),
        format!("{} {}", grey.stock_code, grey.short_name).bright_white()
    );

    let change = format!("{:+.2}%", grey.change_percent);
    let change = if grey.change_percent < 0.0 {
        change.red()
    } else {
        change.green()
    };

    let mut table = new_table();
    table.add_row(prettytable::row!["Price", grey.current_price]);
    table.add_row(prettytable::row!["Change", change]);
    table.add_row(prettytable::row!["IPO price", grey.ipo_pricing]);
    table.add_row(prettytable::row!["Volume", group_thousands(grey.volume)]);
    table.add_row(prettytable::row!["Turnover", group_thousands(grey.turnover)]);
    table.add_row(prettytable::row!["Listing", cell(&grey.listing_date)]);
    table.add_row(prettytable::row!["Updated", cell(&grey.last_updated)]);
    table.printstd();

    Ok(())
}

pub async fn run_placing(options: CodeOptions, clients: &Clients) -> Result<()> {
    let code = options.code()?;
    let placing = placing_data(clients, &code).await;

    if options.json {
        return print_json(&placing);
    }

    let Some(placing) = placing else {
        println!("\n{}", format!("No placing result for {code}").yellow());
        return Ok(());
    };

    println!(
        "\n{} {}\n",
        "PLACING RESULT".bright_cyan().bold(),
        format!("{} {}", placing.stock_code, placing.stock_name).bright_white()
    );

    let mut table = new_table();
    table.add_row(prettytable::row!["Offer price", placing.ipo_pricing]);
    table.add_row(prettytable::row!["Lot size", placing.lot_size]);
    table.add_row(prettytable::row!["Subscribed (x)", placing.placement_times]);
    table.add_row(prettytable::row!["One-lot rate", format!("{}%", placing.allocation_rate)]);
    table.add_row(prettytable::row!["Claw-back", placing.claw_back]);
    table.add_row(prettytable::row!["Proceeds", placing.raise_money]);
    table.printstd();

    if !placing.allocation_list.is_empty() {
        println!("\n{}", "Allocation tiers".green().bold());
        let mut table = new_table();
        table.add_row(prettytable::row![
            "Shares", "Applicants", "Successful", "Rate %", "Details", "Amount"
        ]);
        for level in &placing.allocation_list {
            let successful = level
                .successful_applicants
                .map(|n| n.to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(prettytable::row![
                level.shares,
                level.applicants,
                successful,
                level.winning_rate,
                cell(&level.allocation_details),
                group_thousands(level.amount)
            ]);
        }
        table.printstd();
    }

    Ok(())
}

pub async fn run_first_day(options: CodeOptions, clients: &Clients) -> Result<()> {
    let code = options.code()?;
    let performance = first_day_data(clients, &code).await;

    if options.json {
        return print_json(&performance);
    }

    let Some(performance) = performance else {
        println!(
            "\n{}",
            format!("No first-day performance data for {code}").yellow()
        );
        return Ok(());
    };

    println!(
        "\n{} {}\n",
        "FIRST DAY".bright_cyan().bold(),
        performance.stock_code.bright_white()
    );

    let mut table = new_table();
    table.add_row(prettytable::row!["Open", performance.open_price]);
    table.add_row(prettytable::row!["High", performance.high_price]);
    table.add_row(prettytable::row!["Low", performance.low_price]);
    table.add_row(prettytable::row!["Close", performance.close_price]);
    table.add_row(prettytable::row!["Change %", performance.change_percent]);
    table.add_row(prettytable::row!["Volume", group_thousands(performance.volume)]);
    table.add_row(prettytable::row!["Turnover %", performance.turnover_rate]);
    table.add_row(prettytable::row!["Listing", cell(&performance.listing_date)]);
    table.printstd();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipo::testing::serve;
    use axum::extract::Query;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use reqwest::Method;
    use std::collections::HashMap;

    const EMPTY_GREY_LIST: &str = r#"{"result":1,"dataList":[]}"#;

    const GREY_LIST: &str = r#"{"result":1,"dataList":[{"symbol":"06603","shortName":"IFBH","greyPrice":"30.5","greyChangeRate":9.71}]}"#;

    const PLACING: &str = r#"{"result":1,"data":{"symbol":"06603","stockname":"IFBH","allocationrate":"10.00%","list":[[100,"150,000","15,000","10.00%","15000名中1手",0,"2,808.03"]]}}"#;

    const DETAIL_PAGE: &str = r#"
        <html>
          <head><title>IFBH - 新股详情</title></head>
          <body>
            <table id="tbInnerDisk"></table>
            <table id="tbPlacingResultDetail">
              <tr><td>100</td><td>90,000</td><td>9,000</td><td>10%</td><td>9000名中1手</td><td>0</td><td>2,808.03</td></tr>
            </table>
            <div id="tbGreyFirstData">
              <table><tr><td>开盘价</td><td>31.2</td></tr></table>
            </div>
          </body>
        </html>
    "#;

    #[tokio::test]
    async fn test_empty_grey_list_falls_back_to_detail_page() {
        let clients = serve(
            Router::new()
                .route(GREY_LIST_PATH, get(|| async { EMPTY_GREY_LIST }))
                .route(IPO_DETAIL_PATH, get(|| async { DETAIL_PAGE })),
        )
        .await;

        let grey = grey_data(&clients, "6603").await.unwrap();

        assert_eq!(grey.stock_code, "06603");
        assert_eq!(grey.short_name, "IFBH");
        assert_eq!(grey.current_price, 0.0);
    }

    #[tokio::test]
    async fn test_grey_list_row_wins_over_detail_page() {
        let clients = serve(
            Router::new()
                .route(GREY_LIST_PATH, get(|| async { GREY_LIST }))
                .route(IPO_DETAIL_PATH, get(|| async { DETAIL_PAGE })),
        )
        .await;

        let grey = grey_data(&clients, "06603").await.unwrap();

        assert_eq!(grey.current_price, 30.5);
        assert_eq!(grey.change_percent, 9.71);
    }

    #[tokio::test]
    async fn test_placing_post_carries_symbol_count_and_lang() {
        let clients = serve(Router::new().route(
            PLACING_RESULT_PATH,
            post(
                |Query(query): Query<HashMap<String, String>>, Json(body): Json<Value>| async move {
                    let expected = json!({"symbol": "06603", "count": -1});
                    if query.get("lang").map(String::as_str) == Some("zh_CN") && body == expected {
                        PLACING
                    } else {
                        r#"{"result":0}"#
                    }
                },
            ),
        ))
        .await;

        let placing = placing_data(&clients, "6603").await.unwrap();

        assert_eq!(placing.stock_name, "IFBH");
        assert_eq!(placing.allocation_rate, 10.0);
        assert_eq!(placing.allocation_list[0].applicants, 150000);
    }

    #[tokio::test]
    async fn test_missing_placing_result_falls_back_to_detail_page() {
        let clients = serve(
            Router::new()
                .route(PLACING_RESULT_PATH, post(|| async { r#"{"result":0}"# }))
                .route(IPO_DETAIL_PATH, get(|| async { DETAIL_PAGE })),
        )
        .await;

        let placing = placing_data(&clients, "6603").await.unwrap();

        assert_eq!(placing.stock_code, "06603");
        assert_eq!(placing.allocation_list.len(), 1);
        assert_eq!(placing.allocation_list[0].applicants, 90000);
    }

    #[tokio::test]
    async fn test_first_day_comes_from_detail_page() {
        let clients = serve(Router::new().route(IPO_DETAIL_PATH, get(|| async { DETAIL_PAGE }))).await;

        let performance = first_day_data(&clients, "6603").await.unwrap();

        assert_eq!(performance.stock_code, "06603");
        assert_eq!(performance.open_price, 31.2);
    }

    #[tokio::test]
    async fn test_detail_requests_prefixed_code() {
        let clients = serve(Router::new().route(
            IPO_DETAIL_PATH,
            get(|Query(query): Query<HashMap<String, String>>| async move {
                if query.get("code").map(String::as_str) == Some("E06603") {
                    r#"{"result":1,"data":{"issuanceinfo":{"name":"IFBH","ipopricing":"18.8"}}}"#
                } else {
                    "{}"
                }
            }),
        ))
        .await;

        let detail = detail_data(&clients, "6603").await;

        assert_eq!(detail.info.stock_name, "IFBH");
        assert_eq!(detail.info.price_range, "18.8港元");
    }

    #[tokio::test]
    async fn test_upstream_error_status_degrades_everything() {
        let clients = serve(Router::new()).await;

        assert_eq!(detail_data(&clients, "6603").await.info.status, "unknown");
        assert!(grey_data(&clients, "6603").await.is_none());
        assert!(placing_data(&clients, "6603").await.is_none());
        assert!(first_day_data(&clients, "6603").await.is_none());
    }

    #[test]
    fn test_placing_request_shape() {
        let clients = Clients::from_config(&crate::config::UpstreamConfig {
            aipo_base_url: "http://127.0.0.1:9".to_string(),
            jyb_base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "test".to_string(),
            token: None,
            timeout_secs: 1,
            rate_limit: 100,
            rate_limit_window: 3600,
        })
        .unwrap();

        let (query, body) = placing_request("06603");
        let request = clients
            .jyb
            .request(Method::POST, PLACING_RESULT_PATH, &query, Some(&body))
            .unwrap();

        assert_eq!(*request.method(), Method::POST);
        assert_eq!(request.url().path(), PLACING_RESULT_PATH);
        let pairs: HashMap<_, _> = request.url().query_pairs().into_owned().collect();
        assert_eq!(pairs.get("lang").map(String::as_str), Some("zh_CN"));
        assert!(pairs.contains_key("v"));

        let sent: Value =
            serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(sent, json!({"symbol": "06603", "count": -1}));
    }
}
