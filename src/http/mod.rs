//! HTTP transport for the Model Context Protocol
//!
//! A single JSON-RPC endpoint at `/mcp` plus health and discovery routes.

pub mod handlers;
