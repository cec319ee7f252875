//! Axum HTTP handlers for the web server
//!
//! Provides the Model Context Protocol endpoint and the metadata endpoints.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: String,
    pub version: String,
    pub mcp_endpoint: &'static str,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    let info = state.server.info();
    Json(DiscoveryResponse {
        name: info.name.clone(),
        version: info.version.clone(),
        mcp_endpoint: "/mcp",
    })
}

pub async fn mcp_endpoint(State(state): State<AppState>, body: Bytes) -> Response {
    let outcome = state.server.dispatch_slice(&body);
    match outcome.body {
        Some(response) => (outcome.status, Json(response)).into_response(),
        None => outcome.status.into_response(),
    }
}
