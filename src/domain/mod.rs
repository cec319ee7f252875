//! Method handlers behind the dispatcher
//!
//! Each handler decodes its own `params` object and returns the JSON result
//! object, or an `AppError` that the dispatcher turns into an error envelope.

pub mod builtin_tools;
pub mod prompts;
pub mod resources;
pub mod tools;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Decodes a `params` object into the handler's parameter shape.
pub fn parse_params<T: DeserializeOwned>(params: Map<String, Value>) -> Result<T, AppError> {
    serde_json::from_value(Value::Object(params)).map_err(AppError::invalid_params)
}

pub fn to_result<T: Serialize>(result: T) -> Result<Value, AppError> {
    serde_json::to_value(result)
        .map_err(|err| AppError::internal(format!("result serialization failed: {err}")))
}
