//! JSON-RPC envelope representations and formatting utilities
//!
//! Provides the response envelope, the fixed protocol error codes, and the mapping
//! of internal `AppError`s to valid JSON-RPC error payloads.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::AppError;

pub const JSONRPC_VERSION: &str = "2.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    InternalError,
}

impl ErrorCode {
    pub fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::InternalError => -32603,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::ParseError => "Parse error",
            Self::InvalidRequest => "Invalid Request",
            Self::MethodNotFound => "Method not found",
            Self::InvalidParams => "Invalid params",
            Self::InternalError => "Internal error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestId {
    Integer(i64),
    String(String),
}

impl RequestId {
    pub fn from_value(value: &Value) -> Option<Self> {
        if let Some(string_id) = value.as_str() {
            return Some(Self::String(string_id.to_string()));
        }

        value.as_i64().map(Self::Integer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A response envelope. `id` is always written, as `null` when the request's
/// identity could not be recovered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Option<RequestId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl JsonRpcResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

pub fn app_error_to_json_rpc(id: Option<RequestId>, err: AppError) -> JsonRpcResponse {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            ErrorCode::InvalidParams,
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::MethodNotFound { .. } => json_rpc_error(id, ErrorCode::MethodNotFound),
        AppError::Internal { message } => {
            tracing::error!(error = %message, "request failed with internal error");
            json_rpc_error(id, ErrorCode::InternalError)
        }
    }
}

pub fn json_rpc_error(id: Option<RequestId>, code: ErrorCode) -> JsonRpcResponse {
    json_rpc_error_with_data(id, code, None)
}

pub fn json_rpc_error_with_data(
    id: Option<RequestId>,
    code: ErrorCode,
    data: Option<Value>,
) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION,
        id,
        result: None,
        error: Some(RpcError {
            code: code.code(),
            message: code.message().to_string(),
            data,
        }),
    }
}

/// Wraps a handler result; a handler returning nothing answers with `{}`.
pub fn json_rpc_result(id: RequestId, result: Value) -> JsonRpcResponse {
    let result = match result {
        Value::Null => json!({}),
        other => other,
    };

    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION,
        id: Some(id),
        result: Some(result),
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_error_envelope_has_null_id() {
        let response = json_rpc_error(None, ErrorCode::ParseError);
        assert_eq!(
            serde_json::to_value(response).expect("serialize"),
            json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})
        );
    }

    #[test]
    fn bad_request_maps_to_invalid_params_with_data() {
        let response = app_error_to_json_rpc(
            Some(RequestId::Integer(7)),
            AppError::bad_request("unknown_prompt", "no prompt named `x`"),
        );
        let error = response.error.expect("error payload");
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Invalid params");
        assert_eq!(
            error.data,
            Some(json!({"code": "unknown_prompt", "message": "no prompt named `x`", "details": {}}))
        );
    }

    #[test]
    fn internal_errors_do_not_leak_messages() {
        let response = app_error_to_json_rpc(
            Some(RequestId::String("a".to_string())),
            AppError::internal("database password is hunter2"),
        );
        let value = serde_json::to_value(response).expect("serialize");
        assert_eq!(
            value,
            json!({"jsonrpc": "2.0", "id": "a", "error": {"code": -32603, "message": "Internal error"}})
        );
    }

    #[test]
    fn null_result_becomes_empty_object() {
        let response = json_rpc_result(RequestId::Integer(1), Value::Null);
        assert_eq!(response.result, Some(json!({})));
    }

    #[test]
    fn request_ids_accept_strings_and_integers_only() {
        assert_eq!(RequestId::from_value(&json!(3)), Some(RequestId::Integer(3)));
        assert_eq!(
            RequestId::from_value(&json!("abc")),
            Some(RequestId::String("abc".to_string()))
        );
        assert_eq!(RequestId::from_value(&json!(1.5)), None);
        assert_eq!(RequestId::from_value(&json!(true)), None);
        assert_eq!(RequestId::from_value(&json!(null)), None);
    }
}
