//! Provider-facing request and reply

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::response::Usage;
use super::tool::{ToolCall, ToolDefinition};

/// Parameters of one provider call, built by the gateway from a
/// [`GatewayRequest`](super::GatewayRequest).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub model: String,
    pub system: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Raw provider output. This is also the cached payload: the metadata
/// block is still embedded in `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderReply {
    pub content: String,
    pub model: String,
    pub usage: Usage,
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}
