//! Parameter type model and JSON Schema derivation
//!
//! Every declared tool parameter resolves to a closed [`ParamType`] at registration
//! time. String type expressions (`"Optional[int]"`, `"list[int | str] | None"`) are
//! parsed here so that no unresolved name ever reaches a generated schema.

use std::{collections::HashMap, fmt, str::FromStr};

use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    Integer,
    Number,
    String,
    Boolean,
}

impl Primitive {
    pub fn json_type(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    Primitive(Primitive),
    /// Sequence container, optionally parameterized by its element type.
    Array(Option<Box<ParamType>>),
    /// Mapping container with string keys, optionally parameterized by its value type.
    ObjectMap(Option<Box<ParamType>>),
    AnyOf(Vec<ParamType>),
    Nullable(Box<ParamType>),
    Unconstrained,
}

impl ParamType {
    pub fn integer() -> Self {
        Self::Primitive(Primitive::Integer)
    }

    pub fn number() -> Self {
        Self::Primitive(Primitive::Number)
    }

    pub fn string() -> Self {
        Self::Primitive(Primitive::String)
    }

    pub fn boolean() -> Self {
        Self::Primitive(Primitive::Boolean)
    }

    pub fn array_of(items: ParamType) -> Self {
        Self::Array(Some(Box::new(items)))
    }

    pub fn map_of(values: ParamType) -> Self {
        Self::ObjectMap(Some(Box::new(values)))
    }

    pub fn nullable(inner: ParamType) -> Self {
        match inner {
            already @ Self::Nullable(_) => already,
            other => Self::Nullable(Box::new(other)),
        }
    }

    /// True for optional types and unions that include `None`. `Any` accepts
    /// null as a value but still has to be supplied.
    pub fn is_nullable(&self) -> bool {
        matches!(self, Self::Nullable(_))
    }

    /// Maps the type to its JSON Schema fragment.
    pub fn fragment(&self) -> Map<String, Value> {
        let mut fragment = Map::new();
        match self {
            Self::Primitive(primitive) => {
                fragment.insert("type".to_string(), json!(primitive.json_type()));
            }
            Self::Array(items) => {
                fragment.insert("type".to_string(), json!("array"));
                if let Some(items) = items {
                    fragment.insert("items".to_string(), Value::Object(items.fragment()));
                }
            }
            Self::ObjectMap(values) => {
                fragment.insert("type".to_string(), json!("object"));
                if let Some(values) = values {
                    fragment.insert(
                        "additionalProperties".to_string(),
                        Value::Object(values.fragment()),
                    );
                }
            }
            Self::AnyOf(branches) => {
                let branches = branches
                    .iter()
                    .map(|branch| Value::Object(branch.fragment()))
                    .collect();
                fragment.insert("anyOf".to_string(), Value::Array(branches));
            }
            Self::Nullable(inner) => {
                fragment = inner.fragment();
                allow_null(&mut fragment);
            }
            Self::Unconstrained => {}
        }
        fragment
    }

    /// Reports whether a JSON argument value fits this type.
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Primitive(Primitive::Integer) => value.is_i64() || value.is_u64(),
            Self::Primitive(Primitive::Number) => value.is_number(),
            Self::Primitive(Primitive::String) => value.is_string(),
            Self::Primitive(Primitive::Boolean) => value.is_boolean(),
            Self::Array(items) => match (value.as_array(), items) {
                (Some(elements), Some(items)) => elements.iter().all(|item| items.accepts(item)),
                (Some(_), None) => true,
                (None, _) => false,
            },
            Self::ObjectMap(values) => match (value.as_object(), values) {
                (Some(entries), Some(values)) => entries.values().all(|item| values.accepts(item)),
                (Some(_), None) => true,
                (None, _) => false,
            },
            Self::AnyOf(branches) => branches.iter().any(|branch| branch.accepts(value)),
            Self::Nullable(inner) => value.is_null() || inner.accepts(value),
            Self::Unconstrained => true,
        }
    }
}

fn allow_null(fragment: &mut Map<String, Value>) {
    if let Some(branches) = fragment.get_mut("anyOf").and_then(Value::as_array_mut) {
        let null_branch = json!({"type": "null"});
        if !branches.contains(&null_branch) {
            branches.push(null_branch);
        }
        return;
    }

    match fragment.get_mut("type") {
        Some(Value::String(single)) => {
            let single = std::mem::take(single);
            fragment.insert("type".to_string(), json!([single, "null"]));
        }
        Some(Value::Array(types)) => {
            if !types.iter().any(|item| item == "null") {
                types.push(json!("null"));
            }
        }
        // `{}` already admits null.
        _ => {}
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(Primitive::Integer) => write!(f, "int"),
            Self::Primitive(Primitive::Number) => write!(f, "float"),
            Self::Primitive(Primitive::String) => write!(f, "str"),
            Self::Primitive(Primitive::Boolean) => write!(f, "bool"),
            Self::Array(None) => write!(f, "list"),
            Self::Array(Some(items)) => write!(f, "list[{items}]"),
            Self::ObjectMap(None) => write!(f, "dict"),
            Self::ObjectMap(Some(values)) => write!(f, "dict[str, {values}]"),
            Self::AnyOf(branches) => {
                for (index, branch) in branches.iter().enumerate() {
                    if index > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{branch}")?;
                }
                Ok(())
            }
            Self::Nullable(inner) => write!(f, "{inner} | None"),
            Self::Unconstrained => write!(f, "Any"),
        }
    }
}

/// Rust types that describe themselves as tool parameter types.
pub trait DescribeType {
    fn param_type() -> ParamType;
}

macro_rules! describe_primitive {
    ($primitive:expr => $($ty:ty),+) => {
        $(impl DescribeType for $ty {
            fn param_type() -> ParamType {
                ParamType::Primitive($primitive)
            }
        })+
    };
}

describe_primitive!(Primitive::Integer => i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
describe_primitive!(Primitive::Number => f32, f64);
describe_primitive!(Primitive::String => String);
describe_primitive!(Primitive::Boolean => bool);

impl<T: DescribeType> DescribeType for Vec<T> {
    fn param_type() -> ParamType {
        ParamType::array_of(T::param_type())
    }
}

impl<T: DescribeType> DescribeType for HashMap<String, T> {
    fn param_type() -> ParamType {
        ParamType::map_of(T::param_type())
    }
}

impl<T: DescribeType> DescribeType for Option<T> {
    fn param_type() -> ParamType {
        ParamType::nullable(T::param_type())
    }
}

impl DescribeType for Value {
    fn param_type() -> ParamType {
        ParamType::Unconstrained
    }
}

impl DescribeType for Map<String, Value> {
    fn param_type() -> ParamType {
        ParamType::ObjectMap(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("unexpected end of type expression")]
    UnexpectedEnd,
    #[error("unexpected token `{0}` in type expression")]
    UnexpectedToken(String),
    #[error("unknown type name `{0}`")]
    UnknownName(String),
    #[error("`{name}` expects {expected} type argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },
    #[error("mapping keys must be strings, got `{0}`")]
    NonStringKey(String),
    #[error("`None` is not a parameter type on its own")]
    BareNone,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Name(String),
    Open,
    Close,
    Comma,
    Pipe,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Open => write!(f, "["),
            Self::Close => write!(f, "]"),
            Self::Comma => write!(f, ","),
            Self::Pipe => write!(f, "|"),
        }
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>, TypeParseError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        match ch {
            '[' => tokens.push(Token::Open),
            ']' => tokens.push(Token::Close),
            ',' => tokens.push(Token::Comma),
            '|' => tokens.push(Token::Pipe),
            ch if ch.is_whitespace() => {}
            ch if ch.is_alphanumeric() || ch == '_' || ch == '.' => {
                let mut end = start + ch.len_utf8();
                while let Some(&(index, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '.' {
                        end = index + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                tokens.push(Token::Name(input[start..end].to_string()));
            }
            other => return Err(TypeParseError::UnexpectedToken(other.to_string())),
        }
    }

    Ok(tokens)
}

/// Intermediate form where `None` is still a union member.
#[derive(Debug, Clone, PartialEq)]
enum Parsed {
    None,
    Type(ParamType),
}

struct Parser {
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Result<Token, TypeParseError> {
        let token = self
            .tokens
            .get(self.position)
            .cloned()
            .ok_or(TypeParseError::UnexpectedEnd)?;
        self.position += 1;
        Ok(token)
    }

    fn expect(&mut self, expected: Token) -> Result<(), TypeParseError> {
        let token = self.next()?;
        if token == expected {
            Ok(())
        } else {
            Err(TypeParseError::UnexpectedToken(token.to_string()))
        }
    }

    fn union(&mut self) -> Result<Parsed, TypeParseError> {
        let mut members = vec![self.atom()?];
        while self.peek() == Some(&Token::Pipe) {
            self.position += 1;
            members.push(self.atom()?);
        }
        Ok(combine(members))
    }

    fn arguments(&mut self) -> Result<Vec<Parsed>, TypeParseError> {
        if self.peek() != Some(&Token::Open) {
            return Ok(Vec::new());
        }
        self.position += 1;

        let mut arguments = vec![self.union()?];
        loop {
            match self.next()? {
                Token::Comma => arguments.push(self.union()?),
                Token::Close => return Ok(arguments),
                other => return Err(TypeParseError::UnexpectedToken(other.to_string())),
            }
        }
    }

    fn atom(&mut self) -> Result<Parsed, TypeParseError> {
        let name = match self.next()? {
            Token::Name(name) => name,
            other => return Err(TypeParseError::UnexpectedToken(other.to_string())),
        };
        let arguments = self.arguments()?;
        let found = arguments.len();
        let short = name.rsplit('.').next().unwrap_or(&name).to_string();

        let arity = |expected: &'static str| TypeParseError::Arity {
            name: short.clone(),
            expected,
            found,
        };

        let parsed = match short.as_str() {
            "None" | "NoneType" | "null" if found == 0 => Parsed::None,
            "int" | "integer" if found == 0 => Parsed::Type(ParamType::integer()),
            "float" | "number" if found == 0 => Parsed::Type(ParamType::number()),
            "str" | "string" if found == 0 => Parsed::Type(ParamType::string()),
            "bool" | "boolean" if found == 0 => Parsed::Type(ParamType::boolean()),
            "Any" | "any" if found == 0 => Parsed::Type(ParamType::Unconstrained),
            "list" | "List" | "Sequence" | "set" | "Set" | "tuple" | "Tuple" | "array" => {
                match arguments.as_slice() {
                    [] => Parsed::Type(ParamType::Array(None)),
                    [items] => Parsed::Type(ParamType::array_of(resolve(items.clone())?)),
                    _ => return Err(arity("0 or 1")),
                }
            }
            "dict" | "Dict" | "Mapping" | "object" => match arguments.as_slice() {
                [] => Parsed::Type(ParamType::ObjectMap(None)),
                [key, values] => {
                    if *key != Parsed::Type(ParamType::string()) {
                        return Err(TypeParseError::NonStringKey(describe(key)));
                    }
                    Parsed::Type(ParamType::map_of(resolve(values.clone())?))
                }
                _ => return Err(arity("0 or 2")),
            },
            "Optional" => match arguments.as_slice() {
                [inner] => combine(vec![inner.clone(), Parsed::None]),
                _ => return Err(arity("1")),
            },
            "Union" => {
                if arguments.is_empty() {
                    return Err(arity("at least 1"));
                }
                combine(arguments)
            }
            "None" | "NoneType" | "null" | "int" | "integer" | "float" | "number" | "str"
            | "string" | "bool" | "boolean" | "Any" | "any" => return Err(arity("0")),
            _ => return Err(TypeParseError::UnknownName(name)),
        };

        Ok(parsed)
    }
}

fn describe(parsed: &Parsed) -> String {
    match parsed {
        Parsed::None => "None".to_string(),
        Parsed::Type(ty) => ty.to_string(),
    }
}

fn resolve(parsed: Parsed) -> Result<ParamType, TypeParseError> {
    match parsed {
        Parsed::None => Err(TypeParseError::BareNone),
        Parsed::Type(ty) => Ok(ty),
    }
}

/// Folds union members into a single type; `None` members turn the result nullable.
fn combine(members: Vec<Parsed>) -> Parsed {
    let mut nullable = false;
    let mut branches: Vec<ParamType> = Vec::new();

    for member in members {
        match member {
            Parsed::None => nullable = true,
            Parsed::Type(ParamType::Nullable(inner)) => {
                nullable = true;
                push_branch(&mut branches, *inner);
            }
            Parsed::Type(ty) => push_branch(&mut branches, ty),
        }
    }

    let combined = match branches.len() {
        0 => return Parsed::None,
        1 => branches.remove(0),
        _ => ParamType::AnyOf(branches),
    };

    if nullable {
        Parsed::Type(ParamType::nullable(combined))
    } else {
        Parsed::Type(combined)
    }
}

fn push_branch(branches: &mut Vec<ParamType>, branch: ParamType) {
    match branch {
        ParamType::AnyOf(nested) => {
            for branch in nested {
                push_branch(branches, branch);
            }
        }
        branch if !branches.contains(&branch) => branches.push(branch),
        _ => {}
    }
}

impl FromStr for ParamType {
    type Err = TypeParseError;

    fn from_str(expression: &str) -> Result<Self, Self::Err> {
        let mut parser = Parser {
            tokens: tokenize(expression)?,
            position: 0,
        };
        let parsed = parser.union()?;
        if let Some(trailing) = parser.peek() {
            return Err(TypeParseError::UnexpectedToken(trailing.to_string()));
        }
        resolve(parsed)
    }
}

/// A parameter type as written at the registration site.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeRef {
    Resolved(ParamType),
    Forward(String),
}

impl TypeRef {
    pub fn resolve(&self) -> Result<ParamType, TypeParseError> {
        match self {
            Self::Resolved(ty) => Ok(ty.clone()),
            Self::Forward(expression) => expression.parse(),
        }
    }
}

impl From<ParamType> for TypeRef {
    fn from(ty: ParamType) -> Self {
        Self::Resolved(ty)
    }
}

impl From<&str> for TypeRef {
    fn from(expression: &str) -> Self {
        Self::Forward(expression.to_string())
    }
}

impl From<String> for TypeRef {
    fn from(expression: String) -> Self {
        Self::Forward(expression)
    }
}

/// One declared parameter after its type has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParam {
    pub name: String,
    pub ty: ParamType,
    pub default: Option<Value>,
}

impl ResolvedParam {
    /// Parameters with a default or a nullable type may be omitted by callers.
    pub fn is_required(&self) -> bool {
        self.default.is_none() && !self.ty.is_nullable()
    }
}

/// Builds the object schema for a parameter list.
///
/// Returns `None` for a callable without parameters: such tools carry no input
/// schema at all rather than an object schema with empty `properties`.
pub fn input_schema(params: &[ResolvedParam]) -> Option<Map<String, Value>> {
    if params.is_empty() {
        return None;
    }

    let mut properties = Map::new();
    let mut required = Vec::new();
    for param in params {
        properties.insert(param.name.clone(), Value::Object(param.ty.fragment()));
        if param.is_required() {
            required.push(Value::String(param.name.clone()));
        }
    }

    let mut schema = Map::new();
    schema.insert("type".to_string(), json!("object"));
    schema.insert("properties".to_string(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".to_string(), Value::Array(required));
    }
    Some(schema)
}
