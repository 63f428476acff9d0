//! Tool types for function calling

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool definition forwarded to the provider verbatim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Input of a tool call, resolved once at the provider boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolInput {
    /// The provider returned (or we could decode) a JSON object.
    Parsed(Map<String, Value>),
    /// Anything that is not a JSON object, kept as text.
    Raw(String),
}

impl ToolInput {
    /// Resolve a provider-supplied value.
    ///
    /// Objects are taken as-is; strings holding a JSON object are decoded;
    /// everything else is kept raw.
    pub fn resolve(value: Value) -> Self {
        match value {
            Value::Object(map) => ToolInput::Parsed(map),
            Value::String(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => ToolInput::Parsed(map),
                Err(_) => ToolInput::Raw(text),
            },
            other => ToolInput::Raw(other.to_string()),
        }
    }

    pub fn as_parsed(&self) -> Option<&Map<String, Value>> {
        match self {
            ToolInput::Parsed(map) => Some(map),
            ToolInput::Raw(_) => None,
        }
    }
}

/// A tool call made by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub input: ToolInput,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input: ToolInput::resolve(input),
        }
    }
}

/// Input of the first tool call, or an empty map when there is no call or
/// its input could not be decoded into an object.
pub fn first_tool_input(tool_calls: &[ToolCall]) -> Map<String, Value> {
    tool_calls
        .first()
        .and_then(|call| call.input.as_parsed())
        .cloned()
        .unwrap_or_default()
}
