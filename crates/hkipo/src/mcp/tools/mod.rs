mod ipo;

use hkipo_core::args::{
    ToolCall, GET_ALLOCATION_INFO, GET_FIRST_DAY_PERFORMANCE, GET_GREY_MARKET_DATA,
    GET_IPO_DETAILS, GET_MARKET_OVERVIEW, LIST_ACTIVE_IPOS, SEARCH_IPO_BY_NAME,
};
use hkipo_core::response::ToolResponse;
use serde::{Deserialize, Serialize};

// Re-export types needed by tool handlers
pub use super::{Context, JsonRpcError, Tool, INTERNAL_ERROR, INVALID_PARAMS};

/// Protocol revision announced by `initialize`
const PROTOCOL_VERSION: &str = "2024-11-05";

// MCP Protocol types for tools
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub tools: Option<ToolsCapability>,
}

#[derive(Debug, Serialize)]
pub struct ToolsCapability {}

#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
pub struct ToolsList {
    pub tools: Vec<Tool>,
}

#[derive(Debug, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum Content {
    #[serde(rename = "text")]
    Text { text: String },
}

fn to_result_value<T: Serialize>(value: T) -> Result<serde_json::Value, JsonRpcError> {
    serde_json::to_value(value)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Internal error: {e}")))
}

pub fn handle_initialize() -> Result<serde_json::Value, JsonRpcError> {
    to_result_value(InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: ServerCapabilities {
            tools: Some(ToolsCapability {}),
        },
        server_info: ServerInfo {
            name: "hkipo".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
    })
}

fn stock_code_schema(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "stock_code": {
                "type": "string",
                "description": description,
                "pattern": "^[0-9]{4,5}$"
            }
        },
        "required": ["stock_code"]
    })
}

pub fn tool_catalog() -> Vec<Tool> {
    vec![
        Tool {
            name: LIST_ACTIVE_IPOS.to_string(),
            description: "List Hong Kong IPOs currently open for subscription. Returns a paginated list with stock code, name, offer price range, lot size, subscription period, listing date, sponsor and industry.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "industry": {
                        "type": "string",
                        "description": "Filter by industry sector (optional)"
                    },
                    "pageIndex": {
                        "type": "number",
                        "description": "Page number, 1-indexed (default: 1)",
                        "default": 1
                    },
                    "pageSize": {
                        "type": "number",
                        "description": "Listings per page (default: 20, max: 100)",
                        "default": 20,
                        "minimum": 1,
                        "maximum": 100
                    }
                },
                "required": []
            }),
        },
        Tool {
            name: GET_IPO_DETAILS.to_string(),
            description: "Get the full detail of a Hong Kong IPO: offering terms, company profile, underwriting syndicate, use of proceeds, management and cornerstone investors. Also returns a human-readable summary in formatted_info.".to_string(),
            input_schema: stock_code_schema("Stock code, e.g. '06603' or '6603'"),
        },
        Tool {
            name: GET_ALLOCATION_INFO.to_string(),
            description: "Get the placing (allocation) result of a Hong Kong IPO: subscription multiple, claw-back, one-lot success rate and the per-tier allocation table. Returns null data when results are not published yet.".to_string(),
            input_schema: stock_code_schema("Stock code, e.g. '06603'"),
        },
        Tool {
            name: GET_GREY_MARKET_DATA.to_string(),
            description: "Get the grey-market (pre-listing) quote of a Hong Kong IPO: price, change, volume and turnover. Returns null data when no grey-market trading is available.".to_string(),
            input_schema: stock_code_schema("Stock code, e.g. '06603'"),
        },
        Tool {
            name: GET_FIRST_DAY_PERFORMANCE.to_string(),
            description: "Get the first trading day performance of a Hong Kong IPO: open, high, low and close prices, change, volume and turnover rate. Returns null data when the stock has not listed yet.".to_string(),
            input_schema: stock_code_schema("Stock code, e.g. '06603'"),
        },
        Tool {
            name: SEARCH_IPO_BY_NAME.to_string(),
            description: "Search active Hong Kong IPOs by company name (case-insensitive). Matches substrings by default, or the whole name with exact_match.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "company_name": {
                        "type": "string",
                        "description": "Company name or part of it"
                    },
                    "exact_match": {
                        "type": "boolean",
                        "description": "Require the whole name to match (default: false)",
                        "default": false
                    }
                },
                "required": ["company_name"]
            }),
        },
        Tool {
            name: GET_MARKET_OVERVIEW.to_string(),
            description: "Get aggregate statistics over the active Hong Kong IPOs: count, average market cap, average P/E ratio and industry distribution.".to_string(),
            input_schema: serde_json::json!({
                "type": "object",
                "properties": {
                    "days": {
                        "type": "number",
                        "description": "Reporting window in days (default: 30, max: 365)",
                        "default": 30,
                        "minimum": 1,
                        "maximum": 365
                    }
                },
                "required": []
            }),
        },
    ]
}

pub fn handle_tools_list() -> Result<serde_json::Value, JsonRpcError> {
    to_result_value(ToolsList {
        tools: tool_catalog(),
    })
}

pub async fn handle_tools_call(
    params: Option<serde_json::Value>,
    ctx: &Context,
) -> Result<serde_json::Value, JsonRpcError> {
    let params: CallToolParams = serde_json::from_value(params.unwrap_or(serde_json::Value::Null))
        .map_err(|e| JsonRpcError::new(INVALID_PARAMS, format!("Invalid params: {e}")))?;

    let response = match ToolCall::parse(&params.name, params.arguments.as_ref()) {
        Ok(call) => {
            log::info!("Tool call: {}", call.name());
            ipo::execute(call, ctx).await
        }
        Err(e) => {
            log::warn!("Rejected {} call: {e}", params.name);
            ToolResponse::failure(e.to_string(), format!("Invalid call to {}", params.name))
        }
    };

    to_result_value(call_tool_result(&response)?)
}

/// Wrap an envelope into the single pretty-printed text block MCP expects
pub fn call_tool_result(response: &ToolResponse) -> Result<CallToolResult, JsonRpcError> {
    let text = serde_json::to_string_pretty(response)
        .map_err(|e| JsonRpcError::new(INTERNAL_ERROR, format!("Serialization error: {e}")))?;

    Ok(CallToolResult {
        content: vec![Content::Text { text }],
        is_error: response.is_error().then_some(true),
    })
}
