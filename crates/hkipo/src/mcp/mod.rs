mod cli;
mod sse;
mod stdio;
mod tools;

pub use cli::App;

use crate::client::Clients;
use crate::prelude::*;
use serde::{Deserialize, Serialize};

pub const PARSE_ERROR: i32 = -32700;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

// JSON-RPC 2.0 types
#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<serde_json::Value>,
    method: String,
    params: Option<serde_json::Value>,
}

impl JsonRpcRequest {
    /// Notifications carry no id and never get a response
    fn is_notification(&self) -> bool {
        self.id.is_none() || self.method.starts_with("notifications/")
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: String,
    id: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn new(id: Option<serde_json::Value>, outcome: Result<serde_json::Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(error) => (None, Some(error)),
        };
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result,
            error,
        }
    }

    /// Reply to a message whose id could not be read
    pub(crate) fn parse_error(message: impl Into<String>) -> Self {
        Self::new(None, Err(JsonRpcError::new(PARSE_ERROR, message)))
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

// MCP Protocol types
#[derive(Debug, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: serde_json::Value,
}

/// Shared state of one server process
#[derive(Debug, Clone)]
pub struct Context {
    pub clients: Clients,
    pub verbose: bool,
}

impl Context {
    pub fn from_global(global: &crate::Global) -> Result<Self> {
        Ok(Self {
            clients: Clients::from_config(&global.upstream)?,
            verbose: global.verbose,
        })
    }
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let ctx = Context::from_global(&global)?;

    log::info!(
        "Rate limit configured at {} requests per {}s (not enforced)",
        global.upstream.rate_limit,
        global.upstream.rate_limit_window
    );

    match app.command {
        cli::Commands::Stdio => stdio::run_stdio(ctx).await,
        cli::Commands::Sse(options) => sse::run_sse(options, ctx).await,
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Handle one JSON-RPC message
///
/// Returns `None` for notifications.
pub async fn handle_request(request_str: &str, ctx: &Context) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(request_str) {
        Ok(req) => req,
        Err(e) => {
            log::warn!("Rejecting malformed JSON-RPC message: {e}");
            return Some(JsonRpcResponse::parse_error(format!("Parse error: {e}")));
        }
    };

    if request.is_notification() {
        log::debug!("Notification {}", request.method);
        return None;
    }

    let result = match request.method.as_str() {
        "initialize" => tools::handle_initialize(),
        "ping" => Ok(serde_json::json!({})),
        "tools/list" => tools::handle_tools_list(),
        "tools/call" => tools::handle_tools_call(request.params, ctx).await,
        method => Err(JsonRpcError::new(
            METHOD_NOT_FOUND,
            format!("Method not found: {method}"),
        )),
    };

    Some(JsonRpcResponse::new(request.id, result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpstreamConfig;
    use serde_json::{json, Value};

    /// Points at a closed local port so nothing leaves the machine
    pub(crate) fn test_context() -> Context {
        let config = UpstreamConfig {
            aipo_base_url: "http://127.0.0.1:9".to_string(),
            jyb_base_url: "http://127.0.0.1:9".to_string(),
            user_agent: "test".to_string(),
            token: None,
            timeout_secs: 1,
            rate_limit: 100,
            rate_limit_window: 3600,
        };
        Context {
            clients: Clients::from_config(&config).unwrap(),
            verbose: false,
        }
    }

    async fn call(message: Value) -> Option<Value> {
        let ctx = test_context();
        handle_request(&message.to_string(), &ctx)
            .await
            .map(|response| serde_json::to_value(response).unwrap())
    }

    #[tokio::test]
    async fn test_parse_error() {
        let ctx = test_context();
        let response = handle_request("{not json", &ctx).await.unwrap();
        let value = serde_json::to_value(response).unwrap();

        assert_eq!(value["error"]["code"], PARSE_ERROR);
        assert!(value["id"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let value = call(json!({"jsonrpc": "2.0", "id": 1, "method": "resources/list"}))
            .await
            .unwrap();

        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(value["id"], 1);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let initialized = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert!(call(initialized).await.is_none());

        let no_id = json!({"jsonrpc": "2.0", "method": "tools/list"});
        assert!(call(no_id).await.is_none());
    }

    #[tokio::test]
    async fn test_initialize_and_ping() {
        let value = call(json!({"jsonrpc": "2.0", "id": "a", "method": "initialize"}))
            .await
            .unwrap();
        assert_eq!(value["result"]["serverInfo"]["name"], "hkipo");
        assert!(value["result"]["capabilities"]["tools"].is_object());

        let value = call(json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}))
            .await
            .unwrap();
        assert_eq!(value["result"], json!({}));
    }

    #[tokio::test]
    async fn test_tools_list_has_every_tool() {
        let value = call(json!({"jsonrpc": "2.0", "id": 3, "method": "tools/list"}))
            .await
            .unwrap();

        let names: Vec<&str> = value["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|tool| tool["name"].as_str().unwrap())
            .collect();

        assert_eq!(
            names,
            vec![
                "list_active_ipos",
                "get_ipo_details",
                "get_allocation_info",
                "get_grey_market_data",
                "get_first_day_performance",
                "search_ipo_by_name",
                "get_market_overview",
            ]
        );
    }

    #[tokio::test]
    async fn test_tools_call_invalid_params() {
        let value = call(json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call", "params": {"arguments": {}}}))
            .await
            .unwrap();

        assert_eq!(value["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_tools_call_bad_arguments_is_failure_envelope() {
        let value = call(json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "get_ipo_details", "arguments": {}}
        }))
        .await
        .unwrap();

        let result = &value["result"];
        assert_eq!(result["isError"], true);

        let text = result["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["success"], false);
        assert_eq!(envelope["error"], "Missing required argument: stock_code");
    }

    #[tokio::test]
    async fn test_tools_call_unknown_tool_is_failure_envelope() {
        let value = call(json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "tools/call",
            "params": {"name": "md_fetch"}
        }))
        .await
        .unwrap();

        assert_eq!(value["result"]["isError"], true);
        let text = value["result"]["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("Unknown tool: md_fetch"));
    }
}
