use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod registry;

use mcp::server::McpServer;

#[derive(Clone)]
pub struct AppState {
    pub server: Arc<McpServer>,
}

impl AppState {
    pub fn new(server: McpServer) -> Self {
        Self {
            server: Arc::new(server),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/mcp", post(http::handlers::mcp_endpoint))
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::domain::builtin_tools::register_builtin_tools;
    use crate::mcp::server::{ServerInfo, NOTIFICATION_STATUS};
    use crate::registry::{RegistrationError, ToolCallable, ToolError, ToolOptions, ToolRegistry};

    use super::*;

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        register_builtin_tools(&registry).expect("builtin tools");
        registry
            .register(
                ToolCallable::new("explode", |_| Err(ToolError::msg("kaboom"))),
                ToolOptions::default(),
            )
            .expect("register explode");
        registry
    }

    fn app() -> Router {
        let info = ServerInfo {
            instructions: Some("Use the echo tool to test connectivity.".to_string()),
            ..ServerInfo::default()
        };
        build_app(AppState::new(McpServer::new(info, Arc::new(registry()))))
    }

    fn post_mcp(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .uri("/mcp")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .expect("request build")
    }

    async fn send(request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
        let response = app().oneshot(request).await.expect("request execution");
        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes();
        (status, body)
    }

    async fn send_json(payload: Value) -> (StatusCode, Value) {
        let (status, body) = send(post_mcp(payload.to_string())).await;
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        (status, body_json)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send(
            Request::builder()
                .uri("/health")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"status\":\"ok\"}");
    }

    #[tokio::test]
    async fn discovery_points_at_mcp_endpoint() {
        let (status, body) = send(
            Request::builder()
                .uri("/.well-known/mcp")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(body_json["mcp_endpoint"], "/mcp");
        assert_eq!(body_json["name"], env!("CARGO_PKG_NAME"));
    }

    #[tokio::test]
    async fn mcp_rejects_get() {
        let (status, _) = send(
            Request::builder()
                .uri("/mcp")
                .method("GET")
                .body(Body::empty())
                .expect("request build"),
        )
        .await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn root_post_does_not_provide_mcp() {
        let request = Request::builder()
            .uri("/")
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#))
            .expect("request build");
        let (status, _) = send(request).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn mcp_unknown_method_returns_method_not_found() {
        let (status, body) = send(post_mcp(r#"{"jsonrpc":"2.0","id":1,"method":"x/y"}"#)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(
            body_json,
            json!({"jsonrpc": "2.0", "id": 1, "error": {"code": -32601, "message": "Method not found"}})
        );
    }

    #[tokio::test]
    async fn mcp_parse_error_has_null_id() {
        let (status, body) = send(post_mcp("{\"jsonrpc\": \"2.0\", ")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body_json: Value = serde_json::from_slice(&body).expect("valid json response");
        assert_eq!(
            body_json,
            json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})
        );
    }

    #[tokio::test]
    async fn mcp_batches_are_invalid_requests() {
        let (status, body) = send_json(json!([
            {"jsonrpc": "2.0", "id": 1, "method": "ping"},
            {"jsonrpc": "2.0", "id": 2, "method": "ping"}
        ]))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], -32600);
        assert_eq!(body["id"], Value::Null);
    }

    #[tokio::test]
    async fn mcp_notification_is_acknowledged_without_body() {
        let (status, body) = send(post_mcp(
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
        ))
        .await;

        assert_eq!(status, NOTIFICATION_STATUS);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn mcp_initialize_returns_result() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": "init",
            "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "clientInfo": {"name": "test-client", "version": "1.0.0"},
                "capabilities": {}
            }
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], "init");
        assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
        assert_eq!(body["result"]["serverInfo"]["version"], env!("CARGO_PKG_VERSION"));
        assert_eq!(
            body["result"]["instructions"],
            "Use the echo tool to test connectivity."
        );
        assert!(body["result"]["capabilities"]["tools"].is_object());
        assert!(body["result"]["capabilities"]["resources"].is_object());
    }

    #[tokio::test]
    async fn mcp_tools_list_reports_registered_tools() {
        let (status, body) =
            send_json(json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list", "params": {}})).await;

        assert_eq!(status, StatusCode::OK);
        let names: Vec<&str> = body["result"]["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .filter_map(|tool| tool["name"].as_str())
            .collect();
        assert_eq!(names, ["echo", "add", "utc_now", "explode"]);
        assert_eq!(
            body["result"]["tools"][3]["inputSchema"],
            json!({"type": "object"})
        );
    }

    #[tokio::test]
    async fn mcp_tools_call_returns_structured_content() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": 3,
            "method": "tools/call",
            "params": {"name": "add", "arguments": {"a": 2, "b": 3}}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["isError"], false);
        assert_eq!(body["result"]["structuredContent"], json!({"sum": 5.0}));
    }

    #[tokio::test]
    async fn mcp_tools_call_unknown_tool_is_error_result() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": 4,
            "method": "tools/call",
            "params": {"name": "nope", "arguments": {}}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.get("error").is_none());
        assert_eq!(body["result"]["isError"], true);
        assert_eq!(body["result"]["content"][0]["text"], "Tool 'nope' not found.");
    }

    #[tokio::test]
    async fn mcp_tools_call_failing_tool_is_error_result() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": 5,
            "method": "tools/call",
            "params": {"name": "explode"}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["isError"], true);
        assert!(body["result"]["content"][0]["text"]
            .as_str()
            .expect("text content")
            .contains("kaboom"));
    }

    #[tokio::test]
    async fn mcp_tools_call_missing_argument_is_error_result() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": 6,
            "method": "tools/call",
            "params": {"name": "echo", "arguments": {}}
        }))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["isError"], true);
    }

    #[tokio::test]
    async fn mcp_invalid_params_echo_the_id() {
        let (status, body) = send_json(json!({
            "jsonrpc": "2.0",
            "id": "abc",
            "method": "tools/call",
            "params": {"arguments": {}}
        }))
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["id"], "abc");
        assert_eq!(body["error"]["code"], -32602);
        assert_eq!(body["error"]["message"], "Invalid params");
    }

    #[test]
    fn duplicate_tool_names_replace_in_place() {
        let registry = registry();
        registry
            .register(
                ToolCallable::new("echo", |_| Ok("replaced".into())),
                ToolOptions::default(),
            )
            .expect("re-register echo");

        let tools = registry.list();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[0].name, "echo");
        assert_eq!(tools[0].input_schema, json!({"type": "object"}).as_object().cloned().expect("object"));
    }

    #[test]
    fn nameless_tools_are_rejected() {
        let err = registry()
            .register(ToolCallable::new("", |_| Ok(Value::Null.into())), ToolOptions::default())
            .expect_err("empty name");
        assert!(matches!(err, RegistrationError::EmptyName));
    }
}
