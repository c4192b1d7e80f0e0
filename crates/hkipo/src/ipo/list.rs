use crate::prelude::{println, *};
use colored::Colorize;
use hkipo_core::args::{DEFAULT_DAYS, DEFAULT_PAGE_INDEX, DEFAULT_PAGE_SIZE, MAX_DAYS, MAX_PAGE_SIZE};
use hkipo_core::list::parse_ipo_list;
use hkipo_core::stats::{build_market_overview, search_by_name};
use hkipo_core::types::{IpoInfo, MarketOverview, PaginatedResponse, SearchOutput};

use super::{cell, now_timestamp, print_json};
use crate::client::{Clients, IPO_LIST_PATH};

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Filter by industry sector
    #[arg(short, long, default_value = "")]
    pub industry: String,

    /// Page number (1-indexed)
    #[arg(short, long, default_value_t = DEFAULT_PAGE_INDEX)]
    pub page: u64,

    /// Listings per page (1-100)
    #[arg(short = 's', long, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct SearchOptions {
    /// Company name or part of it
    #[arg(value_name = "NAME")]
    pub company_name: String,

    /// Require the whole name to match (case-insensitive)
    #[arg(short, long)]
    pub exact: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct OverviewOptions {
    /// Reporting window in days (1-365)
    #[arg(short, long, default_value_t = DEFAULT_DAYS)]
    pub days: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Fetch one page of active listings
///
/// Transport failures are logged and reported as an empty page.
pub async fn list_data(
    clients: &Clients,
    industry: &str,
    page_index: u64,
    page_size: u64,
) -> PaginatedResponse<IpoInfo> {
    let query = [
        ("sector", industry.to_string()),
        ("pageIndex", page_index.to_string()),
        ("pageSize", page_size.to_string()),
    ];

    match clients.aipo.get(IPO_LIST_PATH, &query).await {
        Ok(body) => parse_ipo_list(&body, page_index, page_size),
        Err(e) => {
            log::error!("Failed to fetch IPO list: {e}");
            PaginatedResponse::empty(page_index, page_size)
        }
    }
}

/// Search the first page of active listings (up to the maximum page size)
pub async fn search_data(clients: &Clients, company_name: &str, exact_match: bool) -> SearchOutput {
    let page = list_data(clients, "", 1, MAX_PAGE_SIZE).await;
    search_by_name(&page.items, company_name, exact_match)
}

pub async fn overview_data(clients: &Clients, days: u32) -> MarketOverview {
    let page = list_data(clients, "", 1, MAX_PAGE_SIZE).await;
    build_market_overview(&page.items, days, &now_timestamp())
}

pub async fn run_list(options: ListOptions, clients: &Clients) -> Result<()> {
    let page_index = options.page.max(1);
    let page_size = options.page_size.clamp(1, MAX_PAGE_SIZE);
    let page = list_data(clients, options.industry.trim(), page_index, page_size).await;

    if options.json {
        return print_json(&page);
    }

    let total_pages = requested_pages(page.total_count, page_size);

    println!(
        "\n{}",
        format!(
            "ACTIVE IPOS (page {} of {}, {} total)",
            page.page_index,
            total_pages.max(1),
            page.total_count
        )
        .bright_cyan()
        .bold()
    );

    if page.items.is_empty() {
        println!("\n{}", "No active IPOs found.".yellow());
        return Ok(());
    }

    print_listing_table(&page.items);

    if let Some(command) = next_page_command(page.page_index, total_pages, page_size) {
        println!("\n{}: {}", "Next page".green(), command.cyan());
    }

    Ok(())
}

pub async fn run_search(options: SearchOptions, clients: &Clients) -> Result<()> {
    let company_name = options.company_name.trim();
    if company_name.is_empty() {
        return Err(eyre!("Company name must not be empty"));
    }

    let output = search_data(clients, company_name, options.exact).await;

    if options.json {
        return print_json(&output);
    }

    println!(
        "\nFound {} IPO(s) matching {}\n",
        output.matched_count.to_string().bright_yellow(),
        format!("{:?}", output.keyword).bright_white()
    );

    if !output.items.is_empty() {
        print_listing_table(&output.items);
    }

    Ok(())
}

pub async fn run_overview(options: OverviewOptions, clients: &Clients) -> Result<()> {
    let overview = overview_data(clients, options.days.clamp(1, MAX_DAYS)).await;

    if options.json {
        return print_json(&overview);
    }

    println!(
        "\n{} ({})\n",
        "MARKET OVERVIEW".bright_cyan().bold(),
        overview.period
    );

    let stats = &overview.statistics;
    let mut table = new_table();
    table.add_row(prettytable::row!["Listings", overview.total_ipos]);
    table.add_row(prettytable::row!["Active", stats.active_ipos]);
    table.add_row(prettytable::row![
        "Avg market cap",
        format!("{:.2}", stats.avg_market_cap)
    ]);
    table.add_row(prettytable::row!["Avg P/E", format!("{:.2}", stats.avg_pe_ratio)]);
    table.add_row(prettytable::row!["Updated", overview.last_updated]);
    table.printstd();

    if !stats.industries.is_empty() {
        println!("\n{}", "Industries".green().bold());
        let mut table = new_table();
        for (industry, count) in &stats.industries {
            table.add_row(prettytable::row![industry, count]);
        }
        table.printstd();
    }

    Ok(())
}

/// Page count for the size the user asked for
///
/// The upstream page reports its row count as the page size, which undercounts
/// the page size on a short last page.
fn requested_pages(total_count: u64, page_size: u64) -> u64 {
    total_count.div_ceil(page_size.max(1))
}

fn next_page_command(page_index: u64, total_pages: u64, page_size: u64) -> Option<String> {
    if page_index >= total_pages {
        return None;
    }

    let mut command = format!("hkipo ipo list --page {}", page_index + 1);
    if page_size != DEFAULT_PAGE_SIZE {
        command.push_str(&format!(" --page-size {page_size}"));
    }
    Some(command)
}

fn print_listing_table(items: &[IpoInfo]) {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Code", "Name", "Price", "Lot", "Subscription", "Listing", "Industry"
    ]);

    for item in items {
        table.add_row(prettytable::row![
            cell(&item.stock_code),
            cell(&item.stock_name),
            cell(&item.price_range),
            item.lot_size,
            cell(&item.subscription_period),
            cell(&item.listing_date),
            cell(&item.industry)
        ]);
    }

    table.printstd();
}
