//! Tool listing shapes and tool result helpers
//!
//! Parameters and results come from `rust_mcp_sdk::schema`. The tool listing is
//! the exception: its input schemas are kept as raw JSON objects so keywords such
//! as `additionalProperties`, `anyOf` or nullable type lists survive intact.

use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent, ToolAnnotations};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The public shape of a tool as returned by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub input_schema: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_schema: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotations: Option<ToolAnnotations>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListToolsResult {
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

pub fn text_block(text: impl Into<String>) -> ContentBlock {
    ContentBlock::from(TextContent::new(text.into(), None, None))
}

/// A successful tool result. `isError` is always written.
pub fn tool_success(
    content: Vec<ContentBlock>,
    structured_content: Option<Map<String, Value>>,
) -> CallToolResult {
    CallToolResult {
        content,
        is_error: Some(false),
        meta: None,
        structured_content,
    }
}

pub fn tool_failure(message: impl Into<String>) -> CallToolResult {
    CallToolResult {
        content: vec![text_block(message)],
        is_error: Some(true),
        meta: None,
        structured_content: None,
    }
}

/// Text of the first content block, when it is a text block.
pub fn first_text(result: &CallToolResult) -> Option<&str> {
    match result.content.first() {
        Some(ContentBlock::TextContent(content)) => Some(content.text.as_str()),
        _ => None,
    }
}
