//! Structural classification of inbound messages
//!
//! Runs before any method-specific validation so that structurally broken input
//! is answered with `Invalid Request` rather than `Invalid params`.

use serde_json::{Map, Value};
use tracing::debug;

use crate::mcp::rpc::RequestId;

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// The body was not decodable JSON.
    ParseFailure,
    /// Decodable, but not something this server can answer. Carries the request
    /// identity when one could be recovered.
    InvalidShape { id: Option<RequestId> },
    Notification(Map<String, Value>),
    Request {
        id: RequestId,
        body: Map<String, Value>,
    },
}

pub fn classify_slice(body: &[u8]) -> Message {
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => classify(payload),
        Err(err) => {
            debug!(error = %err, "request body is not valid json");
            Message::ParseFailure
        }
    }
}

pub fn classify(payload: Value) -> Message {
    let Value::Object(body) = payload else {
        return Message::InvalidShape { id: None };
    };

    let id = match body.get("id") {
        None => None,
        Some(raw_id) => match RequestId::from_value(raw_id) {
            Some(id) => Some(id),
            None => return Message::InvalidShape { id: None },
        },
    };

    match (id, body.contains_key("method")) {
        (None, true) => Message::Notification(body),
        (Some(id), true) => Message::Request { id, body },
        (id, false) => Message::InvalidShape { id },
    }
}
