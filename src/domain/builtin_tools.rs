//! Tools registered by the server binary at startup

use chrono::{FixedOffset, SecondsFormat, Utc};
use rust_mcp_sdk::schema::ToolAnnotations;
use serde_json::{json, Value};

use crate::registry::{
    RegistrationError, ToolCallable, ToolError, ToolOptions, ToolOutput, ToolRegistry,
};

pub fn register_builtin_tools(registry: &ToolRegistry) -> Result<(), RegistrationError> {
    registry.register(echo(), read_only())?;
    registry.register(add(), read_only())?;
    registry.register(utc_now(), read_only())?;
    Ok(())
}

fn read_only() -> ToolOptions {
    ToolOptions {
        annotations: Some(ToolAnnotations {
            read_only_hint: Some(true),
            open_world_hint: Some(false),
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn echo() -> ToolCallable {
    ToolCallable::new("echo", |args| {
        let message = args
            .get("message")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolError::msg("message must be a string"))?;
        let repeat = args.get("repeat").and_then(Value::as_u64).unwrap_or(1);
        if repeat > 100 {
            return Err(ToolError::msg("repeat must not exceed 100"));
        }

        let lines = vec![message; repeat as usize];
        Ok(ToolOutput::from(lines.join("\n")))
    })
    .doc(
        "Echo a message back to the caller.\n\
         \n\
         Args:\n    \
             message: Text to send back.\n    \
             repeat: How many times to repeat it, one per line.",
    )
    .typed_param::<String>("message")
    .param_with_default("repeat", "int", 1)
}

fn add() -> ToolCallable {
    ToolCallable::new("add", |args| {
        let a = args.get("a").and_then(Value::as_f64).unwrap_or_default();
        let b = args.get("b").and_then(Value::as_f64).unwrap_or_default();
        Ok(json!({ "sum": a + b }).into())
    })
    .doc(
        "Add two numbers.\n\
         \n\
         Args:\n    \
             a (float): First addend.\n    \
             b (float): Second addend.",
    )
    .typed_param::<f64>("a")
    .typed_param::<f64>("b")
}

fn utc_now() -> ToolCallable {
    ToolCallable::new("utc_now", |args| {
        let offset_minutes = args
            .get("offset_minutes")
            .and_then(Value::as_i64)
            .unwrap_or(0);
        let offset = offset_minutes
            .checked_mul(60)
            .and_then(|seconds| i32::try_from(seconds).ok())
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ToolError::msg("offset_minutes must be within +/- 24 hours"))?;

        let now = Utc::now();
        Ok(json!({
            "utc": now.to_rfc3339_opts(SecondsFormat::Millis, true),
            "local": now.with_timezone(&offset).to_rfc3339_opts(SecondsFormat::Millis, false),
            "unix_seconds": now.timestamp(),
        })
        .into())
    })
    .doc(
        "Report the current time.\n\
         \n\
         :param offset_minutes: Optional UTC offset applied to the local rendering.",
    )
    .param("offset_minutes", "Optional[int]")
}
