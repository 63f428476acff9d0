//! Gateway request type

use serde::{Deserialize, Serialize};

use super::message::ChatMessage;
use super::tool::ToolDefinition;

/// Identifiers carried through to the interaction log. They never influence
/// caching or the provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

/// A single call through the gateway.
///
/// ```rust
/// # use tutorgate::{ChatMessage, GatewayRequest};
/// let request = GatewayRequest::new("You are a tutor.", "Explain derivatives.")
///     .temperature(0.3)
///     .history(vec![ChatMessage::user("Hi"), ChatMessage::assistant("Hello!")])
///     .phase("2")
///     .component("learning_objective");
/// assert!(request.use_cache);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayRequest {
    pub system_prompt: String,
    pub user_message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
    #[serde(default, rename = "chat_history", skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_use_cache")]
    pub use_cache: bool,
    /// Streaming is not supported; a `true` here is logged and ignored.
    #[serde(default)]
    pub stream: bool,
    #[serde(flatten)]
    pub correlation: Correlation,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    750
}

fn default_use_cache() -> bool {
    true
}

impl GatewayRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            tools: Vec::new(),
            history: Vec::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            use_cache: default_use_cache(),
            stream: false,
            correlation: Correlation::default(),
        }
    }

    pub fn tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.tools = tools;
        self
    }

    pub fn history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn user_id(mut self, id: impl Into<String>) -> Self {
        self.correlation.user_id = Some(id.into());
        self
    }

    pub fn conversation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation.conversation_id = Some(id.into());
        self
    }

    pub fn message_id(mut self, id: impl Into<String>) -> Self {
        self.correlation.message_id = Some(id.into());
        self
    }

    pub fn phase(mut self, phase: impl Into<String>) -> Self {
        self.correlation.phase = Some(phase.into());
        self
    }

    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.correlation.component = Some(component.into());
        self
    }

    /// Whether this request may be served from (and written to) the cache.
    pub fn is_cache_eligible(&self, max_temperature: f32) -> bool {
        self.use_cache && self.temperature <= max_temperature
    }
}
