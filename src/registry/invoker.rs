//! Tool invocation
//!
//! Runs a tool function and renders the outcome as a `CallToolResult`. Every
//! failure, including a panic inside the tool, ends up as an error-flagged text
//! block; nothing raised here becomes a protocol error.

use std::{
    any::Any,
    panic::{catch_unwind, AssertUnwindSafe},
};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use rust_mcp_sdk::schema::CallToolResult;

use crate::mcp::types::{text_block, tool_failure, tool_success};
use crate::registry::{ToolDescriptor, ToolError, ToolOutput, ToolRegistry};

pub fn invoke(registry: &ToolRegistry, name: &str, arguments: Map<String, Value>) -> CallToolResult {
    match registry.get(name) {
        Some(descriptor) => invoke_descriptor(&descriptor, arguments),
        None => {
            debug!(tool = %name, "tool not found");
            tool_failure(format!("Tool '{name}' not found."))
        }
    }
}

pub fn invoke_descriptor(descriptor: &ToolDescriptor, arguments: Map<String, Value>) -> CallToolResult {
    let name = &descriptor.name;
    let Some(func) = descriptor.callable() else {
        return tool_failure(format!("Tool '{name}' has no associated function."));
    };

    let outcome = prepare_arguments(descriptor, arguments).and_then(|arguments| {
        catch_unwind(AssertUnwindSafe(|| func(arguments)))
            .unwrap_or_else(|payload| Err(ToolError::Panicked(panic_message(payload.as_ref()))))
    });

    match outcome {
        Ok(output) => render(output),
        Err(err) => {
            warn!(tool = %name, error = %err, "tool invocation failed");
            tool_failure(format!("Error calling tool '{name}': {err}"))
        }
    }
}

/// Fills declared defaults and checks argument types against the declared parameters.
/// Arguments the tool does not declare are passed through untouched.
fn prepare_arguments(
    descriptor: &ToolDescriptor,
    mut arguments: Map<String, Value>,
) -> Result<Map<String, Value>, ToolError> {
    for param in &descriptor.params {
        match arguments.get(&param.name) {
            Some(value) => {
                if !param.ty.accepts(value) {
                    return Err(ToolError::InvalidArgument {
                        name: param.name.clone(),
                        expected: param.ty.to_string(),
                    });
                }
            }
            None => {
                let filled = match (&param.default, param.is_required()) {
                    (Some(default), _) => default.clone(),
                    (None, true) => return Err(ToolError::MissingArgument(param.name.clone())),
                    (None, false) => Value::Null,
                };
                arguments.insert(param.name.clone(), filled);
            }
        }
    }
    Ok(arguments)
}

fn render(output: ToolOutput) -> CallToolResult {
    match output {
        ToolOutput::Content(content) => tool_success(content, None),
        ToolOutput::Value(Value::Object(structured)) => {
            let text = Value::Object(structured.clone()).to_string();
            tool_success(vec![text_block(text)], Some(structured))
        }
        ToolOutput::Value(Value::String(text)) => {
            tool_success(vec![text_block(text)], None)
        }
        ToolOutput::Value(other) => {
            tool_success(vec![text_block(other.to_string())], None)
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::mcp::types::first_text;
    use crate::registry::{ToolCallable, ToolOptions};

    fn registry() -> ToolRegistry {
        let registry = ToolRegistry::new();
        registry
            .register(
                ToolCallable::new("greet", |args| {
                    let name = args["name"].as_str().unwrap_or("stranger");
                    let times = args["times"].as_u64().unwrap_or(1) as usize;
                    Ok(format!("hello {name}").repeat(times).into())
                })
                .param("name", "str")
                .param_with_default("times", "int", 1),
                ToolOptions::default(),
            )
            .expect("register greet");
        registry
            .register(
                ToolCallable::new("stats", |_| Ok(json!({"count": 2, "ok": true}).into())),
                ToolOptions::default(),
            )
            .expect("register stats");
        registry
            .register(
                ToolCallable::new("explode", |_| Err(ToolError::msg("disk on fire"))),
                ToolOptions::default(),
            )
            .expect("register explode");
        registry
            .register(
                ToolCallable::new("panics", |_| panic!("unexpected state")),
                ToolOptions::default(),
            )
            .expect("register panics");
        registry
            .register(ToolCallable::declaration("hollow"), ToolOptions::default())
            .expect("register hollow");
        registry
    }

    fn text_of(result: &CallToolResult) -> &str {
        first_text(result).expect("text content")
    }

    fn failed(result: &CallToolResult) -> bool {
        result.is_error == Some(true)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object arguments")
    }

    #[test]
    fn string_results_become_text() {
        let result = invoke(&registry(), "greet", args(json!({"name": "ada"})));
        assert!(!failed(&result));
        assert_eq!(text_of(&result), "hello ada");
        assert_eq!(result.structured_content, None);
    }

    #[test]
    fn mapping_results_are_also_structured() {
        let result = invoke(&registry(), "stats", Map::new());
        assert!(!failed(&result));
        assert_eq!(
            serde_json::from_str::<Value>(text_of(&result)).expect("json text"),
            json!({"count": 2, "ok": true})
        );
        assert_eq!(
            result.structured_content.map(Value::Object),
            Some(json!({"count": 2, "ok": true}))
        );
    }

    #[test]
    fn unknown_tool_is_an_error_result() {
        let result = invoke(&registry(), "nope", Map::new());
        assert!(failed(&result));
        assert_eq!(text_of(&result), "Tool 'nope' not found.");
    }

    #[test]
    fn missing_function_is_an_error_result() {
        let result = invoke(&registry(), "hollow", Map::new());
        assert!(failed(&result));
        assert_eq!(text_of(&result), "Tool 'hollow' has no associated function.");
    }

    #[test]
    fn tool_failures_carry_their_message() {
        let result = invoke(&registry(), "explode", Map::new());
        assert!(failed(&result));
        assert!(text_of(&result).contains("disk on fire"));
    }

    #[test]
    fn panics_are_contained() {
        let result = invoke(&registry(), "panics", Map::new());
        assert!(failed(&result));
        assert!(text_of(&result).contains("unexpected state"));
    }

    #[test]
    fn defaults_fill_absent_arguments() {
        let result = invoke(&registry(), "greet", args(json!({"name": "x", "times": 2})));
        assert_eq!(text_of(&result), "hello xhello x");
    }

    #[test]
    fn argument_checks_run_before_the_tool() {
        let missing = invoke(&registry(), "greet", Map::new());
        assert!(failed(&missing));
        assert!(text_of(&missing).contains("missing required argument `name`"));

        let mistyped = invoke(&registry(), "greet", args(json!({"name": 5})));
        assert!(failed(&mistyped));
        assert!(text_of(&mistyped).contains("must be of type str"));
    }

    #[test]
    fn any_parameters_must_be_supplied() {
        let registry = ToolRegistry::new();
        registry
            .register(
                ToolCallable::new("store", |args| Ok(args["payload"].clone().into()))
                    .param("payload", "Any")
                    .param("note", "Optional[Any]"),
                ToolOptions::default(),
            )
            .expect("register store");

        let missing = invoke(&registry, "store", Map::new());
        assert!(failed(&missing));
        assert!(text_of(&missing).contains("missing required argument `payload`"));

        let explicit_null = invoke(&registry, "store", args(json!({"payload": null})));
        assert!(!failed(&explicit_null));
        assert_eq!(text_of(&explicit_null), "null");
    }
}
