//! Interaction record handed to the logging tier

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use uuid::Uuid;

use super::request::GatewayRequest;

/// Phase recorded when the request carries none.
pub const UNKNOWN_PHASE: &str = "unknown";

/// One gateway invocation, as logged.
///
/// Built once at the end of [`Gateway::call`](crate::Gateway::call) and moved
/// into the [`InteractionLogger`](crate::logging::InteractionLogger); nothing
/// writes to it afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    pub user_id: Option<String>,
    pub conversation_id: Option<String>,
    pub message_id: Option<String>,
    pub phase: String,
    pub component: Option<String>,
    pub system_prompt: String,
    pub user_message: String,
    /// Output as produced by the provider, metadata block included.
    pub raw_response: String,
    /// Output as shown to the user.
    pub processed_response: String,
    pub model_name: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub request_timestamp: DateTime<Utc>,
    pub response_timestamp: DateTime<Utc>,
    pub duration_ms: u64,
    pub cache_hit: bool,
    /// Path-specific detail (cache key, failure class, mock reason, ...).
    pub metadata: Map<String, Value>,
}

impl InteractionRecord {
    /// Start a record for `request`, received at `requested_at`. Output,
    /// usage and timing fields are left empty for the caller to fill in.
    pub fn new(request: &GatewayRequest, requested_at: DateTime<Utc>) -> Self {
        let correlation = &request.correlation;
        Self {
            id: Uuid::new_v4(),
            user_id: correlation.user_id.clone(),
            conversation_id: correlation.conversation_id.clone(),
            message_id: correlation.message_id.clone(),
            phase: correlation
                .phase
                .clone()
                .unwrap_or_else(|| UNKNOWN_PHASE.to_string()),
            component: correlation.component.clone(),
            system_prompt: request.system_prompt.clone(),
            user_message: request.user_message.clone(),
            raw_response: String::new(),
            processed_response: String::new(),
            model_name: String::new(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            input_tokens: 0,
            output_tokens: 0,
            request_timestamp: requested_at,
            response_timestamp: requested_at,
            duration_ms: 0,
            cache_hit: false,
            metadata: Map::new(),
        }
    }

    /// Subset of fields accepted by every revision of the
    /// `llm_interactions` table. Everything else rides in a JSON-encoded
    /// `metadata` string.
    pub fn minimal_payload(&self) -> Value {
        let mut row = json!({
            "id": self.id,
            "model_name": self.model_name,
            "input_tokens": self.input_tokens,
            "output_tokens": self.output_tokens,
            "metadata": json!({
                "phase": self.phase,
                "component": self.component,
                "duration_ms": self.duration_ms,
                "cache_hit": self.cache_hit,
            })
            .to_string(),
        });
        if let (Some(user_id), Some(obj)) = (&self.user_id, row.as_object_mut()) {
            obj.insert("user_id".into(), Value::String(user_id.clone()));
        }
        row
    }
}
