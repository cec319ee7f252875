use std::sync::Arc;

use mcp_tool_server::{
    build_app,
    config::Config,
    domain::builtin_tools::register_builtin_tools,
    logging,
    mcp::server::McpServer,
    registry::ToolRegistry,
    AppState,
};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;

    let registry = ToolRegistry::new();
    register_builtin_tools(&registry)?;
    let tool_count = registry.len();

    let server = McpServer::new(config.server_info(), Arc::new(registry));
    let bind_socket = config.bind_socket()?;
    let app = build_app(AppState::new(server));
    let listener = tokio::net::TcpListener::bind(bind_socket).await?;

    info!(
        bind_addr = %config.bind_addr,
        bind_port = config.bind_port,
        server_name = %config.server_name,
        tools = tool_count,
        "server starting"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
