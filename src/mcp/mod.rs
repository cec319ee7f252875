//! Model Context Protocol (MCP) message handling
//!
//! Message classification, JSON-RPC envelopes, wire types, audit redaction and
//! the dispatcher that routes methods to their handlers.

pub mod audit;
pub mod classify;
pub mod rpc;
pub mod server;
pub mod types;
