//! Prompt and completion methods
//!
//! No prompts are served. Listing is empty, lookups fail as unknown prompts, and
//! completion requests validate and return no suggestions.

use rust_mcp_sdk::schema::{
    CompleteRequestParams, CompleteRequestRef, GetPromptRequestParams, PaginatedRequestParams,
};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::domain::parse_params;
use crate::errors::AppError;

pub fn handle_prompts_list(params: Map<String, Value>) -> Result<Value, AppError> {
    let _page: PaginatedRequestParams = parse_params(params)?;
    Ok(json!({ "prompts": [] }))
}

pub fn handle_prompts_get(params: Map<String, Value>) -> Result<Value, AppError> {
    let request: GetPromptRequestParams = parse_params(params)?;
    Err(AppError::bad_request(
        "unknown_prompt",
        format!("no prompt named `{}`", request.name),
    ))
}

pub fn handle_completion_complete(params: Map<String, Value>) -> Result<Value, AppError> {
    let request: CompleteRequestParams = parse_params(params)?;
    match &request.ref_ {
        CompleteRequestRef::PromptReference(prompt) => {
            debug!(prompt = %prompt.name, argument = %request.argument.name, "completion requested")
        }
        CompleteRequestRef::ResourceTemplateReference(template) => {
            debug!(uri = %template.uri, argument = %request.argument.name, "completion requested")
        }
    }

    Ok(json!({
        "completion": {
            "values": [],
            "total": 0,
            "hasMore": false
        }
    }))
}
