//! The central Model Context Protocol engine
//!
//! Classifies each inbound message, validates the request envelope, routes the
//! method to its handler and renders the response envelope with the status code
//! the transport should send.

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
};

use axum::http::StatusCode;
use rust_mcp_sdk::schema::{
    CancelledNotificationParams, Implementation, InitializeRequestParams, InitializeResult,
    NotificationParams, ProgressNotificationParams, ServerCapabilities,
    ServerCapabilitiesResources, ServerCapabilitiesTools, SetLevelRequestParams,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use crate::domain::{parse_params, prompts, resources, to_result, tools};
use crate::errors::AppError;
use crate::mcp::{
    audit::redact_audit_params,
    classify::{classify, classify_slice, Message},
    rpc::{
        app_error_to_json_rpc, json_rpc_error, json_rpc_error_with_data, json_rpc_result,
        ErrorCode, JsonRpcResponse, RequestId, JSONRPC_VERSION,
    },
};
use crate::registry::{invoker::panic_message, ToolRegistry};

/// Newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2025-06-18", "2025-03-26", "2024-11-05"];

/// Every notification is acknowledged with this status and no body.
pub const NOTIFICATION_STATUS: StatusCode = StatusCode::NO_CONTENT;

#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
        }
    }
}

/// What the transport sends back: a status code and, unless the message was a
/// notification, a response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub status: StatusCode,
    pub body: Option<JsonRpcResponse>,
}

impl DispatchOutcome {
    fn respond(response: JsonRpcResponse) -> Self {
        let status = if response.is_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::OK
        };
        Self {
            status,
            body: Some(response),
        }
    }

    fn acknowledged() -> Self {
        Self {
            status: NOTIFICATION_STATUS,
            body: None,
        }
    }
}

#[derive(Debug)]
pub struct McpServer {
    info: ServerInfo,
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    pub fn new(info: ServerInfo, registry: Arc<ToolRegistry>) -> Self {
        Self { info, registry }
    }

    pub fn info(&self) -> &ServerInfo {
        &self.info
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Dispatches a raw request body.
    pub fn dispatch_slice(&self, body: &[u8]) -> DispatchOutcome {
        self.dispatch_message(classify_slice(body))
    }

    /// Dispatches an already decoded JSON value.
    pub fn dispatch(&self, payload: Value) -> DispatchOutcome {
        self.dispatch_message(classify(payload))
    }

    fn dispatch_message(&self, message: Message) -> DispatchOutcome {
        match message {
            Message::ParseFailure => {
                DispatchOutcome::respond(json_rpc_error(None, ErrorCode::ParseError))
            }
            Message::InvalidShape { id } => {
                DispatchOutcome::respond(json_rpc_error(id, ErrorCode::InvalidRequest))
            }
            Message::Notification(body) => {
                self.handle_notification(body);
                DispatchOutcome::acknowledged()
            }
            Message::Request { id, body } => {
                DispatchOutcome::respond(self.handle_json_rpc_request(id, body))
            }
        }
    }

    fn handle_json_rpc_request(&self, id: RequestId, body: Map<String, Value>) -> JsonRpcResponse {
        let (method, params) = match validate_envelope(body) {
            Ok(envelope) => envelope,
            Err(detail) => {
                return json_rpc_error_with_data(
                    Some(id),
                    ErrorCode::InvalidParams,
                    Some(json!({
                        "code": "invalid_envelope",
                        "message": detail,
                        "details": {}
                    })),
                )
            }
        };

        let audit_params = redact_audit_params(&params);
        let outcome = catch_unwind(AssertUnwindSafe(|| self.route(&method, params)))
            .unwrap_or_else(|payload| {
                Err(AppError::internal(format!(
                    "handler for `{method}` panicked: {}",
                    panic_message(payload.as_ref())
                )))
            });

        let response = match outcome {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => app_error_to_json_rpc(Some(id), err),
        };

        let outcome = if response.is_error() { "failure" } else { "success" };
        info!(
            method = %method,
            params = %audit_params,
            outcome,
            "mcp action audited"
        );

        response
    }

    fn route(&self, method: &str, params: Map<String, Value>) -> Result<Value, AppError> {
        match method {
            "initialize" => self.handle_initialize(params),
            "ping" => Ok(json!({})),
            "completion/complete" => prompts::handle_completion_complete(params),
            "logging/setLevel" => handle_set_level(params),
            "prompts/get" => prompts::handle_prompts_get(params),
            "prompts/list" => prompts::handle_prompts_list(params),
            "resources/list" => resources::handle_resources_list(params),
            "resources/templates/list" => resources::handle_resource_templates_list(params),
            "resources/read" => resources::handle_resources_read(params),
            "resources/subscribe" => resources::handle_resources_subscribe(params),
            "resources/unsubscribe" => resources::handle_resources_unsubscribe(params),
            "tools/call" => tools::handle_tools_call(&self.registry, params),
            "tools/list" => tools::handle_tools_list(&self.registry, params),
            _ => Err(AppError::method_not_found(method)),
        }
    }

    fn handle_initialize(&self, params: Map<String, Value>) -> Result<Value, AppError> {
        let request: InitializeRequestParams = parse_params(params)?;
        let protocol_version = negotiate_protocol_version(&request.protocol_version);

        info!(
            client = %request.client_info.name,
            client_version = %request.client_info.version,
            offered = %request.protocol_version,
            negotiated = protocol_version,
            "client initializing"
        );

        let initialize_result = InitializeResult {
            server_info: Implementation {
                name: self.info.name.clone(),
                version: self.info.version.clone(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                resources: Some(ServerCapabilitiesResources {
                    subscribe: Some(false),
                    list_changed: Some(false),
                }),
                prompts: None,
                ..Default::default()
            },
            protocol_version: protocol_version.to_string(),
            instructions: self.info.instructions.clone(),
            meta: None,
        };

        let mut result = to_result(initialize_result)?;
        if let Some(capabilities) = result.get_mut("capabilities").and_then(Value::as_object_mut) {
            capabilities.insert("prompts".to_string(), json!({ "listChanged": false }));
            capabilities.insert("completions".to_string(), json!({}));
            capabilities.insert("logging".to_string(), json!({}));
        }
        Ok(result)
    }

    /// Notifications never produce a body, so anything malformed is dropped here.
    fn handle_notification(&self, body: Map<String, Value>) {
        let (method, params) = match validate_envelope(body) {
            Ok(envelope) => envelope,
            Err(detail) => {
                debug!(%detail, "dropping malformed notification");
                return;
            }
        };

        let handled = match method.as_str() {
            "notifications/initialized" => parse_params::<NotificationParams>(params).map(|_| {
                info!("client initialized");
            }),
            "notifications/cancelled" => {
                parse_params::<CancelledNotificationParams>(params).map(|cancelled| {
                    // No in-flight invocation is tracked, so there is nothing to cancel.
                    info!(
                        request_id = ?cancelled.request_id,
                        reason = cancelled.reason.as_deref().unwrap_or(""),
                        "request cancellation received"
                    );
                })
            }
            "notifications/progress" => {
                parse_params::<ProgressNotificationParams>(params).map(|progress| {
                    debug!(
                        token = ?progress.progress_token,
                        progress = progress.progress,
                        total = ?progress.total,
                        message = progress.message.as_deref().unwrap_or(""),
                        "progress notification received"
                    );
                })
            }
            "notifications/roots/list_changed" => {
                parse_params::<NotificationParams>(params).map(|_| {
                    info!("client roots changed");
                })
            }
            other => {
                debug!(method = %other, "ignoring unknown notification");
                Ok(())
            }
        };

        if let Err(err) = handled {
            debug!(method = %method, error = %err, "dropping notification with invalid params");
        }
    }
}

/// Checks the envelope fields shared by requests and notifications and returns
/// the method name with its params object.
fn validate_envelope(mut body: Map<String, Value>) -> Result<(String, Map<String, Value>), String> {
    if let Some(version) = body.get("jsonrpc") {
        if version.as_str() != Some(JSONRPC_VERSION) {
            return Err(format!("jsonrpc must be \"{JSONRPC_VERSION}\""));
        }
    }

    let method = match body.get("method").and_then(Value::as_str).map(str::trim) {
        Some(method) if !method.is_empty() => method.to_string(),
        _ => return Err("method must be a non-empty string".to_string()),
    };

    let params = match body.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => return Err("params must be an object".to_string()),
    };

    Ok((method, params))
}

/// Echoes a supported offer; anything else is answered with the newest version.
pub fn negotiate_protocol_version(offered: &str) -> &'static str {
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .copied()
        .find(|supported| *supported == offered.trim())
        .unwrap_or(SUPPORTED_PROTOCOL_VERSIONS[0])
}

fn handle_set_level(params: Map<String, Value>) -> Result<Value, AppError> {
    let request: SetLevelRequestParams = parse_params(params)?;
    info!(level = ?request.level, "client requested log level");
    Ok(json!({}))
}
