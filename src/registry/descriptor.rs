//! Tool descriptors and the registration-time builder
//!
//! A [`ToolCallable`] carries the declared metadata of a function (name, doc text,
//! ordered parameters) together with the function itself. [`ToolDescriptor::build`]
//! combines it with caller overrides into the immutable descriptor kept by the registry.

use std::{fmt, sync::Arc};

use rust_mcp_sdk::schema::{ContentBlock, ToolAnnotations};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::mcp::types::Tool;
use crate::registry::{
    docstring::parse_doc,
    schema::{input_schema, DescribeType, ResolvedParam, TypeParseError, TypeRef},
};

pub type ToolFn = Arc<dyn Fn(Map<String, Value>) -> Result<ToolOutput, ToolError> + Send + Sync>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("{0}")]
    Failed(String),
    #[error("missing required argument `{0}`")]
    MissingArgument(String),
    #[error("argument `{name}` must be of type {expected}")]
    InvalidArgument { name: String, expected: String },
    #[error("tool panicked: {0}")]
    Panicked(String),
}

impl ToolError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

impl From<serde_json::Error> for ToolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Failed(err.to_string())
    }
}

/// What a tool function hands back on success.
#[derive(Debug, Clone)]
pub enum ToolOutput {
    Value(Value),
    Content(Vec<ContentBlock>),
}

impl From<Value> for ToolOutput {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        Self::Value(Value::String(text))
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        Self::Value(Value::String(text.to_string()))
    }
}

impl From<Vec<ContentBlock>> for ToolOutput {
    fn from(content: Vec<ContentBlock>) -> Self {
        Self::Content(content)
    }
}

#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("tool name must not be empty")]
    EmptyName,
    #[error("parameter `{param}` of tool `{tool}` is declared twice")]
    DuplicateParameter { tool: String, param: String },
    #[error("parameter `{param}` of tool `{tool}` has an unresolvable type: {source}")]
    UnresolvedType {
        tool: String,
        param: String,
        #[source]
        source: TypeParseError,
    },
}

#[derive(Debug, Error)]
pub enum ToolValidationError {
    #[error("tool does not match the public tool shape: {0}")]
    Shape(#[from] serde_json::Error),
    #[error("tool name must not be empty")]
    EmptyName,
    #[error("input schema must be an object schema")]
    NonObjectInputSchema,
}

#[derive(Debug, Clone, PartialEq)]
struct DeclaredParam {
    name: String,
    ty: TypeRef,
    default: Option<Value>,
}

/// A function plus the metadata it is declared with.
#[derive(Clone)]
pub struct ToolCallable {
    name: String,
    doc: Option<String>,
    params: Vec<DeclaredParam>,
    func: Option<ToolFn>,
}

impl ToolCallable {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Map<String, Value>) -> Result<ToolOutput, ToolError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            func: Some(Arc::new(func)),
        }
    }

    /// Declares a tool whose implementation is not attached.
    pub fn declaration(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            params: Vec::new(),
            func: None,
        }
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        self.params.push(DeclaredParam {
            name: name.into(),
            ty: ty.into(),
            default: None,
        });
        self
    }

    pub fn param_with_default(
        mut self,
        name: impl Into<String>,
        ty: impl Into<TypeRef>,
        default: impl Into<Value>,
    ) -> Self {
        self.params.push(DeclaredParam {
            name: name.into(),
            ty: ty.into(),
            default: Some(default.into()),
        });
        self
    }

    pub fn typed_param<T: DescribeType>(self, name: impl Into<String>) -> Self {
        self.param(name, T::param_type())
    }
}

impl fmt::Debug for ToolCallable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolCallable")
            .field("name", &self.name)
            .field("doc", &self.doc)
            .field("params", &self.params)
            .field("has_func", &self.func.is_some())
            .finish()
    }
}

/// Registration overrides. Unset fields are derived from the callable.
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    pub name: Option<String>,
    pub description: Option<String>,
    pub input_schema: Option<Map<String, Value>>,
    pub output_schema: Option<Map<String, Value>>,
    /// Keep the full documentation text as the description instead of only its summary.
    pub use_entire_description: bool,
    pub annotations: Option<ToolAnnotations>,
}

#[derive(Clone)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Option<Map<String, Value>>,
    pub output_schema: Option<Map<String, Value>>,
    pub annotations: Option<ToolAnnotations>,
    pub params: Vec<ResolvedParam>,
    callable: Option<ToolFn>,
}

impl ToolDescriptor {
    pub fn build(callable: ToolCallable, options: ToolOptions) -> Result<Self, RegistrationError> {
        let name = options
            .name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(callable.name);
        if name.trim().is_empty() {
            return Err(RegistrationError::EmptyName);
        }

        let raw_description = options
            .description
            .filter(|description| !description.trim().is_empty())
            .or(callable.doc)
            .unwrap_or_default();
        let doc = parse_doc(&raw_description);
        let description = if options.use_entire_description || raw_description.trim().is_empty() {
            raw_description.trim().to_string()
        } else {
            doc.summary
        };

        let mut params: Vec<ResolvedParam> = Vec::with_capacity(callable.params.len());
        for declared in callable.params {
            if params.iter().any(|param| param.name == declared.name) {
                return Err(RegistrationError::DuplicateParameter {
                    tool: name,
                    param: declared.name,
                });
            }
            let ty = match declared.ty.resolve() {
                Ok(ty) => ty,
                Err(source) => {
                    return Err(RegistrationError::UnresolvedType {
                        tool: name,
                        param: declared.name,
                        source,
                    })
                }
            };
            params.push(ResolvedParam {
                name: declared.name,
                ty,
                default: declared.default,
            });
        }

        let mut derived = input_schema(&params);
        if let Some(properties) = derived
            .as_mut()
            .and_then(|schema| schema.get_mut("properties"))
            .and_then(Value::as_object_mut)
        {
            for (param, text) in &doc.params {
                if let Some(fragment) = properties.get_mut(param).and_then(Value::as_object_mut) {
                    fragment.insert("description".to_string(), Value::String(text.clone()));
                }
            }
        }

        Ok(Self {
            name,
            description,
            input_schema: options.input_schema.or(derived),
            output_schema: options.output_schema,
            annotations: options.annotations,
            params,
            callable: callable.func,
        })
    }

    pub fn callable(&self) -> Option<&ToolFn> {
        self.callable.as_ref()
    }

    /// Renders the descriptor in the public tool shape, checking it on the way.
    pub fn to_tool(&self) -> Result<Tool, ToolValidationError> {
        let mut rendered = Map::new();
        rendered.insert("name".to_string(), json!(self.name));
        if !self.description.is_empty() {
            rendered.insert("description".to_string(), json!(self.description));
        }
        rendered.insert(
            "inputSchema".to_string(),
            self.input_schema
                .clone()
                .map(Value::Object)
                .unwrap_or_else(|| json!({"type": "object"})),
        );
        if let Some(output_schema) = &self.output_schema {
            rendered.insert("outputSchema".to_string(), Value::Object(output_schema.clone()));
        }
        if let Some(annotations) = &self.annotations {
            rendered.insert("annotations".to_string(), serde_json::to_value(annotations)?);
        }

        let tool: Tool = serde_json::from_value(Value::Object(rendered))?;
        if tool.name.trim().is_empty() {
            return Err(ToolValidationError::EmptyName);
        }
        if tool.input_schema.get("type").and_then(Value::as_str) != Some("object") {
            return Err(ToolValidationError::NonObjectInputSchema);
        }
        Ok(tool)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("input_schema", &self.input_schema)
            .field("output_schema", &self.output_schema)
            .field("annotations", &self.annotations)
            .field("has_callable", &self.callable.is_some())
            .finish()
    }
}
