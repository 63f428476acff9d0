//! Anthropic Messages API client.
//!
//! See: <https://docs.anthropic.com/en/api/messages>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::traits::ChatProvider;
use crate::types::{ProviderReply, ProviderRequest, ToolCall, Usage};
use crate::{GatewayError, Result};

/// Default base URL for the Anthropic API
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// API version sent in the `anthropic-version` header
pub const API_VERSION: &str = "2023-06-01";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Transport-level deadline for one HTTP exchange. The retry layer applies
/// its own (shorter) per-attempt deadline on top.
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for the Anthropic Messages API.
#[derive(Clone)]
pub struct AnthropicClient {
    api_key: String,
    http: Client,
    base_url: String,
    timeout: Duration,
}

impl AnthropicClient {
    /// Create a client for the public API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .build()
            .map_err(|e| GatewayError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: DEFAULT_HTTP_TIMEOUT,
        })
    }

    /// Override the transport deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn transport_error(&self, err: reqwest::Error) -> GatewayError {
        if err.is_timeout() {
            GatewayError::Timeout(self.timeout)
        } else if err.is_connect() || err.is_request() {
            GatewayError::Connection(err.to_string())
        } else {
            GatewayError::Http(err.to_string())
        }
    }

    /// Check response status and map to appropriate error.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        match status.as_u16() {
            401 | 403 => Err(GatewayError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(GatewayError::RateLimited { retry_after })
            }
            code => {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<ErrorEnvelope>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or_else(|_| format!("Anthropic API error: {status}"));
                Err(GatewayError::Api {
                    status: code,
                    message,
                })
            }
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(
            model = %request.model,
            temperature = request.temperature,
            messages = request.messages.len(),
            "calling Anthropic"
        );

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let response = Self::check_status(response).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        Ok(body.into_reply(&request.model))
    }
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: ApiUsage,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct ApiUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

impl MessagesResponse {
    /// Concatenate text blocks and resolve tool-use blocks into [`ToolCall`]s.
    fn into_reply(self, requested_model: &str) -> ProviderReply {
        let mut content = String::new();
        let mut tool_calls = Vec::new();
        for block in self.content {
            match block {
                ContentBlock::Text { text } => content.push_str(&text),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input));
                }
                ContentBlock::Other => {}
            }
        }

        ProviderReply {
            content,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            usage: Usage {
                input_tokens: self.usage.input_tokens,
                output_tokens: self.usage.output_tokens,
            },
            tool_calls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolInput;

    #[test]
    fn reply_concatenates_text_and_collects_tools() {
        let body: MessagesResponse = serde_json::from_value(serde_json::json!({
            "model": "claude-test",
            "content": [
                {"type": "text", "text": "Good "},
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "work."},
                {"type": "tool_use", "id": "t1", "name": "evaluate_response",
                 "input": {"overall_score": 2.5}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 7}
        }))
        .unwrap();

        let reply = body.into_reply("fallback");
        assert_eq!(reply.content, "Good work.");
        assert_eq!(reply.model, "claude-test");
        assert_eq!(reply.usage.input_tokens, 12);
        assert_eq!(reply.tool_calls.len(), 1);
        assert!(matches!(reply.tool_calls[0].input, ToolInput::Parsed(_)));
    }

    #[test]
    fn missing_model_falls_back_to_requested() {
        let body: MessagesResponse =
            serde_json::from_value(serde_json::json!({"content": []})).unwrap();
        assert_eq!(body.into_reply("requested").model, "requested");
    }
}
