use hkipo_core::args::ToolCall;
use hkipo_core::format::format_detail;
use hkipo_core::response::ToolResponse;

use super::Context;
use crate::ipo;

/// Run a validated tool call against the upstream hosts
///
/// Upstream problems never surface as failures here: the data functions
/// degrade, so every call resolves to a success envelope.
pub async fn execute(call: ToolCall, ctx: &Context) -> ToolResponse {
    let clients = &ctx.clients;

    match call {
        ToolCall::ListActiveIpos {
            industry,
            page_index,
            page_size,
        } => {
            let page = ipo::list_data(clients, &industry, page_index, page_size).await;
            let message = format!(
                "Found {} active IPOs (page {} of {})",
                page.total_count, page.page_index, page.total_pages
            );
            ToolResponse::success(page, message)
        }

        ToolCall::GetIpoDetails { stock_code } => {
            let detail = ipo::detail_data(clients, &stock_code).await;
            let message = if detail.info.status == "unknown" {
                format!("No detail available for {stock_code}")
            } else {
                format!("Retrieved detail for {stock_code}")
            };
            let formatted = format_detail(&detail);
            ToolResponse::success(detail, message).with_formatted_info(formatted)
        }

        ToolCall::GetAllocationInfo { stock_code } => {
            match ipo::placing_data(clients, &stock_code).await {
                Some(placing) => {
                    let message = format!(
                        "Retrieved placing result for {stock_code} ({} tiers)",
                        placing.allocation_list.len()
                    );
                    ToolResponse::success(placing, message)
                }
                None => ToolResponse::empty(format!(
                    "No placing result available for {stock_code}"
                )),
            }
        }

        ToolCall::GetGreyMarketData { stock_code } => {
            match ipo::grey_data(clients, &stock_code).await {
                Some(grey) => ToolResponse::success(
                    grey,
                    format!("Retrieved grey-market quote for {stock_code}"),
                ),
                None => ToolResponse::empty(format!(
                    "No grey-market data available for {stock_code}"
                )),
            }
        }

        ToolCall::GetFirstDayPerformance { stock_code } => {
            match ipo::first_day_data(clients, &stock_code).await {
                Some(performance) => ToolResponse::success(
                    performance,
                    format!("Retrieved first-day performance for {stock_code}"),
                ),
                None => ToolResponse::empty(format!(
                    "No first-day performance available for {stock_code}"
                )),
            }
        }

        ToolCall::SearchIpoByName {
            company_name,
            exact_match,
        } => {
            let output = ipo::search_data(clients, &company_name, exact_match).await;
            let message = format!(
                "Found {} IPOs matching \"{company_name}\"",
                output.matched_count
            );
            ToolResponse::success(output, message)
        }

        ToolCall::GetMarketOverview { days } => {
            let overview = ipo::overview_data(clients, days).await;
            let message = format!(
                "Market overview of {} active IPOs over the last {days} days",
                overview.total_ipos
            );
            ToolResponse::success(overview, message)
        }
    }
}
