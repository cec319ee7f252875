//! `tools/list` and `tools/call`
//!
//! Both consult the tool registry. Listing is a single page; calls never fail at
//! the protocol level once their parameters decode.

use rust_mcp_sdk::schema::{CallToolRequestParams, PaginatedRequestParams};
use serde_json::{Map, Value};

use crate::domain::{parse_params, to_result};
use crate::errors::AppError;
use crate::mcp::types::ListToolsResult;
use crate::registry::{invoker, ToolRegistry};

pub fn handle_tools_list(registry: &ToolRegistry, params: Map<String, Value>) -> Result<Value, AppError> {
    let page: PaginatedRequestParams = parse_params(params)?;
    if let Some(cursor) = page.cursor {
        tracing::debug!(%cursor, "ignoring cursor, tool listing is a single page");
    }

    to_result(ListToolsResult {
        tools: registry.list(),
        next_cursor: None,
    })
}

pub fn handle_tools_call(registry: &ToolRegistry, params: Map<String, Value>) -> Result<Value, AppError> {
    let tool_call: CallToolRequestParams = parse_params(params)?;
    let arguments = tool_call.arguments.unwrap_or_default();

    to_result(invoker::invoke(registry, &tool_call.name, arguments))
}
