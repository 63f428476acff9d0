//! The gateway orchestrator.
//!
//! Every [`Gateway::call`] walks the same path:
//!
//! ```text
//! CHECK_CACHE ──hit──────────────────────────────┐
//!      │ miss / not eligible                     │
//!      ▼                                         ▼
//! CALL_PROVIDER ──no credential──► MOCK ──► DECODE_METADATA ──► LOG ──► CACHE_WRITE? ──► RETURN
//!      │                                         ▲
//!      └──► LIVE_CALL ──success / exhausted──────┘
//! ```
//!
//! Only cache-eligible requests (caching requested, temperature at or below
//! the configured ceiling) start at `CHECK_CACHE`. Only live successes are
//! written back. Exactly one [`InteractionRecord`] is logged per call.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::time::Instant;
use tracing::{info, warn};

use super::mock::MockResponder;
use crate::cache::{CacheKey, CacheStore};
use crate::error::ProviderFailure;
use crate::logging::InteractionLogger;
use crate::metadata;
use crate::providers::RetryingProviderClient;
use crate::telemetry;
use crate::types::{
    ChatMessage, GatewayRequest, GatewayResponse, InteractionRecord, ProviderReply,
    ProviderRequest,
};

/// Tunables resolved by the builder.
#[derive(Debug, Clone)]
pub(crate) struct GatewaySettings {
    pub model: String,
    pub max_temperature: f32,
    pub prefix_chars: usize,
    pub history_limit: usize,
}

/// How a call was answered.
enum Outcome {
    CacheHit(ProviderReply),
    Mock(ProviderReply),
    Live(ProviderReply),
    Exhausted(ProviderFailure),
}

impl Outcome {
    fn path(&self) -> &'static str {
        match self {
            Outcome::CacheHit(_) => "cache_hit",
            Outcome::Mock(_) => "mock",
            Outcome::Live(_) => "live",
            Outcome::Exhausted(_) => "failed",
        }
    }
}

/// Snapshot of the gateway's collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Provider name, or `None` when answering with mock responses.
    pub provider: Option<String>,
    pub model: String,
    pub durable_store: bool,
    pub cache_entries: usize,
    pub fallback_records: usize,
    pub version: String,
}

impl HealthReport {
    pub fn is_mock(&self) -> bool {
        self.provider.is_none()
    }
}

/// LLM request gateway. Cheap to clone; clones share cache and logger.
#[derive(Clone)]
pub struct Gateway {
    provider: Option<RetryingProviderClient>,
    mock: MockResponder,
    cache: Arc<CacheStore>,
    logger: InteractionLogger,
    settings: GatewaySettings,
}

impl Gateway {
    pub(crate) fn new(
        provider: Option<RetryingProviderClient>,
        cache: Arc<CacheStore>,
        logger: InteractionLogger,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            provider,
            mock: MockResponder::new(&settings.model),
            cache,
            logger,
            settings,
        }
    }

    /// Create a new builder for configuring the gateway.
    pub fn builder() -> super::GatewayBuilder {
        super::GatewayBuilder::new()
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn logger(&self) -> &InteractionLogger {
        &self.logger
    }

    /// Model requested from the provider.
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    /// Whether calls go to a live provider rather than the mock responder.
    pub fn is_live(&self) -> bool {
        self.provider.is_some()
    }

    /// Answer one request. Never fails: provider trouble comes back as a
    /// response with `error` set.
    pub async fn call(&self, request: GatewayRequest) -> GatewayResponse {
        let started = Instant::now();
        let requested_at = Utc::now();

        if request.stream {
            warn!("streaming requested but not supported, answering in one piece");
        }

        let key = request
            .is_cache_eligible(self.settings.max_temperature)
            .then(|| CacheKey::derive(&request, self.settings.prefix_chars));

        let outcome = match key.as_ref().and_then(|k| self.cache.get(k)) {
            Some(entry) => {
                info!(key = key.as_ref().map(CacheKey::short), "serving cached response");
                Outcome::CacheHit(entry.response)
            }
            None => self.call_provider(&request).await,
        };
        let path = outcome.path();

        let mut record = InteractionRecord::new(&request, requested_at);
        record.metadata.insert("tools".into(), tool_names(&request));
        record
            .metadata
            .insert("chat_history_length".into(), json!(request.history.len()));

        let mut cache_write = None;
        let response = match outcome {
            Outcome::CacheHit(reply) => {
                record.cache_hit = true;
                if let Some(key) = &key {
                    record
                        .metadata
                        .insert("cache_key".into(), json!(key.as_str()));
                }
                decode(reply, &mut record)
            }
            Outcome::Mock(reply) => {
                record.metadata.insert("mock_response".into(), json!(true));
                record.metadata.insert("reason".into(), json!("no_api_key"));
                decode(reply, &mut record)
            }
            Outcome::Live(reply) => {
                record
                    .metadata
                    .insert("has_tool_calls".into(), json!(!reply.tool_calls.is_empty()));
                if let Some(key) = &key {
                    cache_write = Some((key.clone(), reply.clone()));
                }
                decode(reply, &mut record)
            }
            Outcome::Exhausted(failure) => self.failure_response(failure, &mut record),
        };

        let elapsed = started.elapsed();
        record.response_timestamp = Utc::now();
        record.duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        metrics::counter!(telemetry::REQUESTS_TOTAL, "path" => path).increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "path" => path)
            .record(elapsed.as_secs_f64());
        metrics::counter!(telemetry::TOKENS_TOTAL, "direction" => "input")
            .increment(u64::from(response.usage.input_tokens));
        metrics::counter!(telemetry::TOKENS_TOTAL, "direction" => "output")
            .increment(u64::from(response.usage.output_tokens));

        info!(
            path,
            model = %response.model,
            duration_ms = record.duration_ms,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "gateway call complete"
        );

        self.logger.log(record);

        if let Some((key, reply)) = cache_write {
            self.cache.put(key, reply);
        }

        response
    }

    async fn call_provider(&self, request: &GatewayRequest) -> Outcome {
        let Some(client) = &self.provider else {
            return Outcome::Mock(self.mock.respond(request));
        };

        let provider_request = self.provider_request(request);
        info!(
            provider = client.name(),
            model = %provider_request.model,
            temperature = provider_request.temperature,
            "calling provider"
        );
        match client.call(&provider_request).await {
            Ok(reply) => Outcome::Live(reply),
            Err(failure) => Outcome::Exhausted(failure),
        }
    }

    /// Build the provider call: the forwardable turns among the most recent
    /// `history_limit` history entries, then the user message.
    pub(crate) fn provider_request(&self, request: &GatewayRequest) -> ProviderRequest {
        let recent = request
            .history
            .len()
            .saturating_sub(self.settings.history_limit);
        let mut messages: Vec<ChatMessage> = request.history[recent..]
            .iter()
            .filter(|m| m.is_forwardable())
            .cloned()
            .collect();
        messages.push(ChatMessage::user(request.user_message.clone()));

        ProviderRequest {
            model: self.settings.model.clone(),
            system: request.system_prompt.clone(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: request.tools.clone(),
        }
    }

    fn failure_response(
        &self,
        failure: ProviderFailure,
        record: &mut InteractionRecord,
    ) -> GatewayResponse {
        let class = failure.class;
        warn!(
            class = %class,
            attempts = failure.attempts,
            error = %failure.message,
            "provider unavailable, returning apology"
        );

        record.raw_response = class.log_marker(&failure.message);
        record.processed_response = class.user_message().to_string();
        record.model_name = self.settings.model.clone();
        record.metadata.insert("error".into(), json!(class.as_str()));
        record
            .metadata
            .insert("error_details".into(), json!(failure.message));
        record
            .metadata
            .insert("attempts".into(), json!(failure.attempts));

        GatewayResponse {
            content: class.user_message().to_string(),
            model: self.settings.model.clone(),
            error: Some(class.error_code().to_string()),
            retry_suggested: true,
            ..Default::default()
        }
    }

    /// Report on provider, store and cache state.
    pub fn health(&self) -> HealthReport {
        HealthReport {
            provider: self.provider.as_ref().map(|p| p.name().to_string()),
            model: match &self.provider {
                Some(_) => self.settings.model.clone(),
                None => self.mock.model().to_string(),
            },
            durable_store: self.logger.durable_available(),
            cache_entries: self.cache.len(),
            fallback_records: self.logger.fallback().len(),
            version: crate::version::version_string(),
        }
    }
}

/// Split the metadata block off a reply and fill the record from it.
fn decode(reply: ProviderReply, record: &mut InteractionRecord) -> GatewayResponse {
    let extracted = metadata::extract(&reply.content);

    record.raw_response = reply.content;
    record.processed_response = extracted.content.clone();
    record.model_name = reply.model.clone();
    record.input_tokens = reply.usage.input_tokens;
    record.output_tokens = reply.usage.output_tokens;

    GatewayResponse {
        content: extracted.content,
        model: reply.model,
        usage: reply.usage,
        tool_calls: reply.tool_calls,
        error: None,
        retry_suggested: false,
        metadata: extracted.metadata,
    }
}

fn tool_names(request: &GatewayRequest) -> Value {
    Value::Array(
        request
            .tools
            .iter()
            .map(|t| Value::String(t.name.clone()))
            .collect(),
    )
}
