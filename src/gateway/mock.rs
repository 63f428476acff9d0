//! Placeholder responses for running without a provider credential.

use crate::metadata;
use crate::types::{GatewayRequest, MetadataValue, ProviderReply, Usage};

/// Prefix added to the model name of every mock reply.
pub const MOCK_MODEL_PREFIX: &str = "MOCK_";

const PREVIEW_CHARS: usize = 100;

/// Deterministic stand-in for the provider.
///
/// The reply text is clearly labelled as a test-mode response and ends in a
/// metadata block carrying fixed default scores, so the rest of the
/// pipeline treats it exactly like provider output.
#[derive(Debug, Clone)]
pub struct MockResponder {
    model: String,
}

impl MockResponder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: format!("{MOCK_MODEL_PREFIX}{}", model.into()),
        }
    }

    /// Model name reported by mock replies.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Scores placed in every mock metadata block.
    pub fn default_scores() -> [(&'static str, MetadataValue); 4] {
        [
            ("Overall_Score", MetadataValue::Int(2)),
            ("Scaffolding_Level", MetadataValue::from("MEDIUM")),
            ("Task_Completion", MetadataValue::Int(2)),
            ("Content_Quality", MetadataValue::Int(2)),
        ]
    }

    pub fn respond(&self, request: &GatewayRequest) -> ProviderReply {
        let correlation = &request.correlation;
        let scores = Self::default_scores();
        let block = metadata::encode(scores.iter().map(|(k, v)| (*k, v)));

        let content = format!(
            "Thank you for your response!\n\n\
             I'm currently running in test mode without access to the AI service. \
             Here's some general feedback:\n\n\
             **Your input**: \"{preview}\"\n\n\
             **Phase**: {phase}\n\
             **Component**: {component}\n\n\
             This is a mock response to help you test the system. To get real AI feedback, \
             please ensure the ANTHROPIC_API_KEY is configured on the backend service.\n\n\
             {block}",
            preview = preview(&request.user_message),
            phase = correlation.phase.as_deref().unwrap_or("Unknown"),
            component = correlation.component.as_deref().unwrap_or("Unknown"),
        );

        let prompt_chars = request.system_prompt.chars().count() + request.user_message.chars().count();
        let usage = Usage {
            input_tokens: estimate_tokens(prompt_chars),
            output_tokens: estimate_tokens(content.chars().count()),
        };

        ProviderReply {
            content,
            model: self.model.clone(),
            usage,
            tool_calls: Vec::new(),
        }
    }
}

fn preview(message: &str) -> String {
    let mut chars = message.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// Four characters per token.
fn estimate_tokens(chars: usize) -> u32 {
    u32::try_from(chars / 4).unwrap_or(u32::MAX)
}
