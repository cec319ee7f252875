//! Resource methods
//!
//! This server exposes no resources of its own; the handlers validate their
//! parameters and answer with empty listings. Subscriptions are acknowledged and
//! not retained.

use rust_mcp_sdk::schema::{
    ListResourcesResult, PaginatedRequestParams, ReadResourceRequestParams, SubscribeRequestParams,
    UnsubscribeRequestParams,
};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::domain::{parse_params, to_result};
use crate::errors::AppError;

pub fn handle_resources_list(params: Map<String, Value>) -> Result<Value, AppError> {
    let _page: PaginatedRequestParams = parse_params(params)?;

    to_result(ListResourcesResult {
        meta: None,
        next_cursor: None,
        resources: vec![],
    })
}

pub fn handle_resource_templates_list(params: Map<String, Value>) -> Result<Value, AppError> {
    let _page: PaginatedRequestParams = parse_params(params)?;
    Ok(json!({ "resourceTemplates": [] }))
}

pub fn handle_resources_read(params: Map<String, Value>) -> Result<Value, AppError> {
    let resource_read: ReadResourceRequestParams = parse_params(params)?;

    Err(AppError::bad_request(
        "resource_not_found",
        format!("unknown resource uri `{}`", resource_read.uri),
    ))
}

pub fn handle_resources_subscribe(params: Map<String, Value>) -> Result<Value, AppError> {
    let subscription: SubscribeRequestParams = parse_params(params)?;
    info!(uri = %subscription.uri, "resource subscription acknowledged");
    Ok(json!({}))
}

pub fn handle_resources_unsubscribe(params: Map<String, Value>) -> Result<Value, AppError> {
    let subscription: UnsubscribeRequestParams = parse_params(params)?;
    info!(uri = %subscription.uri, "resource unsubscription acknowledged");
    Ok(json!({}))
}
