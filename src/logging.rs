//! Logging setup and per-request summaries

use std::time::{Duration, Instant};

use axum::{
    extract::Request,
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::mcp::server::NOTIFICATION_STATUS;

const DEFAULT_FILTER: &str = "info";
const MCP_PATH: &str = "/mcp";

pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// How an HTTP exchange ended, as seen from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Answered,
    Acknowledged,
    RpcError,
    Rejected,
    Failed,
}

impl Outcome {
    fn classify(path: &str, status: StatusCode) -> Self {
        let is_mcp = path == MCP_PATH;
        if status.is_server_error() {
            Self::Failed
        } else if is_mcp && status == NOTIFICATION_STATUS {
            Self::Acknowledged
        } else if is_mcp && status == StatusCode::BAD_REQUEST {
            Self::RpcError
        } else if status.is_client_error() {
            Self::Rejected
        } else {
            Self::Answered
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::Acknowledged => "acknowledged",
            Self::RpcError => "rpc_error",
            Self::Rejected => "rejected",
            Self::Failed => "failed",
        }
    }
}

struct RequestSummary {
    method: Method,
    path: String,
    body_bytes: u64,
}

impl RequestSummary {
    fn of(request: &Request) -> Self {
        let body_bytes = request
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or(0);
        Self {
            method: request.method().clone(),
            path: request.uri().path().to_string(),
            body_bytes,
        }
    }

    fn record(&self, status: StatusCode, elapsed: Duration) {
        let outcome = Outcome::classify(&self.path, status);
        info!(
            method = %self.method,
            path = %self.path,
            status = status.as_u16(),
            body_bytes = self.body_bytes,
            outcome = outcome.as_str(),
            duration_ms = elapsed.as_millis(),
            "request summary"
        );

        match outcome {
            Outcome::Rejected => {
                warn!(method = %self.method, path = %self.path, status = status.as_u16(), "request rejected")
            }
            Outcome::Failed => {
                error!(method = %self.method, path = %self.path, status = status.as_u16(), "request failed")
            }
            _ => {}
        }
    }
}

pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let summary = RequestSummary::of(&request);
    let started_at = Instant::now();

    let response = next.run(request).await;
    summary.record(response.status(), started_at.elapsed());

    response
}
