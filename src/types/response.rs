//! Gateway response type

use serde::{Deserialize, Serialize};

use super::metadata::Metadata;
use super::tool::ToolCall;

/// Token usage statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// What the gateway hands back for every call.
///
/// Provider failures never surface as `Err`: they produce a response with
/// `error` set, `retry_suggested` true and an apology as `content`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GatewayResponse {
    /// Visible content, with the metadata block removed.
    pub content: String,
    pub model: String,
    pub usage: Usage,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub retry_suggested: bool,
    /// Assessment metadata extracted from the raw model output.
    #[serde(default, skip_serializing_if = "Metadata::is_empty")]
    pub metadata: Metadata,
}

impl GatewayResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}
