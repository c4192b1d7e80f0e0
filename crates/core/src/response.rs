//! The `{success, data, message}` envelope every tool answers with

use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    Success {
        success: bool,
        /// `null` when the call worked but nothing was found
        data: Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        formatted_info: Option<String>,
        message: String,
    },
    Failure {
        success: bool,
        error: String,
        message: String,
    },
}

impl ToolResponse {
    pub fn success(data: impl Serialize, message: impl Into<String>) -> Self {
        match serde_json::to_value(data) {
            Ok(data) => Self::Success {
                success: true,
                data,
                formatted_info: None,
                message: message.into(),
            },
            Err(e) => Self::failure(e.to_string(), "Failed to serialize tool output"),
        }
    }

    /// A successful call that found nothing
    pub fn empty(message: impl Into<String>) -> Self {
        Self::Success {
            success: true,
            data: Value::Null,
            formatted_info: None,
            message: message.into(),
        }
    }

    pub fn failure(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: error.into(),
            message: message.into(),
        }
    }

    /// Attach a rendered text summary; no-op on failures
    pub fn with_formatted_info(self, info: String) -> Self {
        match self {
            Self::Success {
                success,
                data,
                message,
                ..
            } => Self::Success {
                success,
                data,
                formatted_info: Some(info),
                message,
            },
            failure => failure,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_shape() {
        let response = ToolResponse::success(json!({"a": 1}), "ok");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value, json!({"success": true, "data": {"a": 1}, "message": "ok"}));
        assert!(!response.is_error());
    }

    #[test]
    fn test_empty_keeps_null_data() {
        let value = serde_json::to_value(ToolResponse::empty("nothing")).unwrap();
        assert_eq!(value, json!({"success": true, "data": null, "message": "nothing"}));
    }

    #[test]
    fn test_failure_shape() {
        let response = ToolResponse::failure("Missing required argument: stock_code", "bad input");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Missing required argument: stock_code");
        assert!(value.get("data").is_none());
        assert!(response.is_error());
    }

    #[test]
    fn test_formatted_info_only_on_success() {
        let response = ToolResponse::success(1, "ok").with_formatted_info("text".to_string());
        assert_eq!(serde_json::to_value(&response).unwrap()["formatted_info"], "text");

        let failure = ToolResponse::failure("e", "m").with_formatted_info("text".to_string());
        assert!(serde_json::to_value(&failure).unwrap().get("formatted_info").is_none());
    }
}
