use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tutorgate::error::FailureClass;
use tutorgate::logging::{LoggerConfig, MemoryStore};
use tutorgate::providers::ChatProvider;
use tutorgate::{
    ChatMessage, Gateway, GatewayError, GatewayRequest, MetadataValue, ProviderReply,
    ProviderRequest, RetryConfig, Result, Role, ToolCall, Usage, first_tool_input,
};

const ASSESSED_REPLY: &str = "Good start on derivatives.\n\n\
<!-- INSTRUCTOR_METADATA\nOverall_Score: 3\nScaffolding_Level: LOW\n-->";

/// Provider returning a fixed reply and recording every request it sees.
struct Scripted {
    reply: ProviderReply,
    seen: Mutex<Vec<ProviderRequest>>,
}

impl Scripted {
    fn new(content: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: ProviderReply {
                content: content.to_string(),
                model: "claude-test".into(),
                usage: Usage {
                    input_tokens: 40,
                    output_tokens: 12,
                },
                tool_calls: vec![],
            },
            seen: Mutex::new(Vec::new()),
        })
    }

    fn with_tool_call(content: &str, call: ToolCall) -> Arc<Self> {
        let mut scripted = Arc::try_unwrap(Self::new(content)).ok().unwrap();
        scripted.reply.tool_calls.push(call);
        Arc::new(scripted)
    }

    fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    fn last_request(&self) -> ProviderRequest {
        self.seen.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait]
impl ChatProvider for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply> {
        self.seen.lock().unwrap().push(request.clone());
        Ok(self.reply.clone())
    }
}

/// Provider that always fails with the given error.
struct AlwaysFails {
    calls: AtomicU32,
    fail_with: fn() -> GatewayError,
}

#[async_trait]
impl ChatProvider for AlwaysFails {
    fn name(&self) -> &str {
        "always-fails"
    }

    async fn send(&self, _request: &ProviderRequest) -> Result<ProviderReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err((self.fail_with)())
    }
}

fn live_gateway(provider: Arc<dyn ChatProvider>) -> Gateway {
    Gateway::builder()
        .provider(provider)
        .retry(RetryConfig::disabled())
        .build()
        .unwrap()
}

fn tutor_request() -> GatewayRequest {
    GatewayRequest::new("You are a tutor.", "Explain derivatives.").temperature(0.3)
}

// ============================================================================
// Mock path
// ============================================================================

#[tokio::test]
async fn mock_end_to_end() {
    let gateway = Gateway::builder().build().unwrap();
    assert!(!gateway.is_live());

    let response = gateway.call(tutor_request()).await;

    assert!(!response.is_error());
    assert!(response.model.starts_with("MOCK_"));
    assert_eq!(response.metadata["overall_score"], MetadataValue::Int(2));
    assert_eq!(response.metadata["task_completion"], MetadataValue::Int(2));
    assert_eq!(response.metadata["content_quality"], MetadataValue::Int(2));
    assert!(!response.content.contains("INSTRUCTOR_METADATA"));
    assert!(!response.content.contains("-->"));
    assert!(response.content.contains("test mode"));
    assert!(response.usage.input_tokens > 0);

    // Mock replies are never cached.
    assert!(gateway.cache().is_empty());

    gateway.logger().flush().await;
    let records = gateway.logger().fallback_records();
    assert_eq!(records.len(), 1);
    assert!(records[0].raw_response.contains("INSTRUCTOR_METADATA"));
    assert_eq!(records[0].processed_response, response.content);
    assert_eq!(records[0].metadata["mock_response"], true);
    assert_eq!(records[0].metadata["reason"], "no_api_key");
}

// ============================================================================
// Cache path
// ============================================================================

#[tokio::test]
async fn identical_request_is_served_from_cache() {
    let provider = Scripted::new(ASSESSED_REPLY);
    let store = Arc::new(MemoryStore::new());
    let gateway = Gateway::builder()
        .provider(provider.clone())
        .store(store.clone())
        .build()
        .unwrap();

    let first = gateway.call(tutor_request()).await;
    let second = gateway.call(tutor_request()).await;

    assert_eq!(provider.calls(), 1, "second call must not reach the provider");
    assert_eq!(first, second);
    assert_eq!(second.content, "Good start on derivatives.");
    assert_eq!(second.metadata["overall_score"], MetadataValue::Int(3));
    assert_eq!(second.usage.input_tokens, 40);

    gateway.logger().flush().await;
    let rows = store.rows("llm_interactions");
    assert_eq!(rows.len(), 2, "every call is logged, cache hits included");
    let cache_hits: Vec<bool> = rows
        .iter()
        .map(|row| {
            let meta: Value = serde_json::from_str(row["metadata"].as_str().unwrap()).unwrap();
            meta["cache_hit"].as_bool().unwrap()
        })
        .collect();
    assert_eq!(cache_hits, vec![false, true]);
}

#[tokio::test]
async fn near_duplicate_requests_share_an_entry() {
    let provider = Scripted::new("answer");
    let gateway = live_gateway(provider.clone());

    let a = tutor_request()
        .history(vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")])
        .user_id("student-a");
    let b = GatewayRequest::new("You are a tutor.", "  Explain derivatives.  ")
        .temperature(0.5)
        .history(vec![
            ChatMessage::user("a different opener"),
            ChatMessage::assistant("hello"),
        ])
        .user_id("student-b");

    gateway.call(a).await;
    gateway.call(b).await;
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn high_temperature_bypasses_cache() {
    let provider = Scripted::new("creative");
    let gateway = live_gateway(provider.clone());

    gateway.call(tutor_request().temperature(0.7)).await;
    gateway.call(tutor_request().temperature(0.7)).await;

    assert_eq!(provider.calls(), 2);
    assert!(gateway.cache().is_empty());
}

#[tokio::test]
async fn temperature_at_ceiling_is_cached() {
    let provider = Scripted::new("steady");
    let gateway = live_gateway(provider.clone());

    gateway.call(tutor_request().temperature(0.6)).await;
    gateway.call(tutor_request().temperature(0.6)).await;

    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn cache_opt_out_is_honoured() {
    let provider = Scripted::new("fresh");
    let gateway = live_gateway(provider.clone());

    gateway.call(tutor_request().use_cache(false)).await;
    gateway.call(tutor_request().use_cache(false)).await;

    assert_eq!(provider.calls(), 2);
    assert!(gateway.cache().is_empty());
}

// ============================================================================
// Failure path
// ============================================================================

#[tokio::test(start_paused = true)]
async fn exhausted_retries_return_apology() {
    let provider = Arc::new(AlwaysFails {
        calls: AtomicU32::new(0),
        fail_with: || GatewayError::Connection("connection reset by peer".into()),
    });
    let gateway = Gateway::builder().provider(provider.clone()).build().unwrap();

    let response = gateway.call(tutor_request()).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 4);
    assert_eq!(response.error.as_deref(), Some("connection_issues"));
    assert!(response.retry_suggested);
    assert_eq!(response.content, FailureClass::Connection.user_message());
    assert!(response.metadata.is_empty());

    // Failures are not cached.
    assert!(gateway.cache().is_empty());
    gateway.call(tutor_request()).await;
    assert_eq!(provider.calls.load(Ordering::SeqCst), 8);

    gateway.logger().flush().await;
    let records = gateway.logger().fallback_records();
    assert_eq!(records.len(), 2);
    assert!(records[0].raw_response.starts_with("CONNECTION_ERROR: "));
    assert_eq!(records[0].metadata["error"], "connection");
    assert_eq!(records[0].metadata["attempts"], 4);
}

#[tokio::test(start_paused = true)]
async fn timeout_failure_uses_timeout_code() {
    let provider = Arc::new(AlwaysFails {
        calls: AtomicU32::new(0),
        fail_with: || GatewayError::Timeout(std::time::Duration::from_secs(80)),
    });
    let gateway = Gateway::builder()
        .provider(provider)
        .retry(RetryConfig::default().max_retries(1))
        .build()
        .unwrap();

    let response = gateway.call(tutor_request()).await;
    assert_eq!(response.error.as_deref(), Some("timeout_after_retries"));
    assert!(response.retry_suggested);

    gateway.logger().flush().await;
    assert_eq!(gateway.logger().fallback_records()[0].raw_response, "TIMEOUT");
}

#[tokio::test]
async fn other_failure_uses_generic_code() {
    let provider = Arc::new(AlwaysFails {
        calls: AtomicU32::new(0),
        fail_with: || GatewayError::AuthenticationFailed,
    });
    let response = live_gateway(provider).call(tutor_request()).await;
    assert_eq!(response.error.as_deref(), Some("provider_error"));
    assert_eq!(response.content, FailureClass::Other.user_message());
}

// ============================================================================
// Request shaping
// ============================================================================

#[tokio::test]
async fn history_is_trimmed_and_filtered() {
    let provider = Scripted::new("ok");
    let gateway = live_gateway(provider.clone());

    let mut history = Vec::new();
    for i in 0..10 {
        history.push(ChatMessage::user(format!("q{i}")));
    }
    history[8] = ChatMessage::new(Role::System, "internal note");
    history[9] = ChatMessage::assistant("");

    gateway
        .call(tutor_request().history(history).use_cache(false))
        .await;

    let sent = provider.last_request();
    let contents: Vec<&str> = sent.messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(
        contents,
        vec!["q2", "q3", "q4", "q5", "q6", "q7", "Explain derivatives."]
    );
    assert_eq!(sent.system, "You are a tutor.");
    assert_eq!(sent.temperature, 0.3);
    assert_eq!(sent.max_tokens, 750);
}

#[tokio::test]
async fn tool_calls_are_passed_through() {
    let call = ToolCall::new(
        "toolu_1",
        "evaluate_response",
        Value::String(r#"{"overall_score": 2.5}"#.into()),
    );
    let provider = Scripted::with_tool_call("", call);
    let gateway = live_gateway(provider);

    let response = gateway.call(tutor_request()).await;
    assert_eq!(response.tool_calls.len(), 1);
    let input = first_tool_input(&response.tool_calls);
    assert_eq!(input["overall_score"], 2.5);

    gateway.logger().flush().await;
    assert_eq!(
        gateway.logger().fallback_records()[0].metadata["has_tool_calls"],
        true
    );
}

#[tokio::test]
async fn streaming_flag_is_ignored() {
    let provider = Scripted::new("whole answer");
    let response = live_gateway(provider)
        .call(tutor_request().stream(true))
        .await;
    assert_eq!(response.content, "whole answer");
}

#[tokio::test]
async fn each_call_is_logged_once() {
    let provider = Scripted::new("ok");
    let gateway = live_gateway(provider);

    for _ in 0..3 {
        gateway.call(tutor_request()).await;
    }
    gateway.call(tutor_request().temperature(0.9)).await;

    gateway.logger().flush().await;
    let records = gateway.logger().fallback_records();
    assert_eq!(records.len(), 4);
    let hits = records.iter().filter(|r| r.cache_hit).count();
    assert_eq!(hits, 2);
}

#[tokio::test]
async fn concurrent_calls_share_cache() {
    let provider = Scripted::new("shared");
    let gateway = live_gateway(provider.clone());
    gateway.call(tutor_request()).await;

    let mut handles = Vec::new();
    for _ in 0..16 {
        let gateway = gateway.clone();
        handles.push(tokio::spawn(async move { gateway.call(tutor_request()).await }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().content, "shared");
    }
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn health_reports_configuration() {
    let store = Arc::new(MemoryStore::new());
    let gateway = Gateway::builder()
        .provider(Scripted::new("ok"))
        .store(store.clone())
        .logger_config(LoggerConfig::default())
        .model("claude-test")
        .build()
        .unwrap();

    let health = gateway.health();
    assert_eq!(health.provider.as_deref(), Some("scripted"));
    assert_eq!(health.model, "claude-test");
    assert!(health.durable_store);
    assert_eq!(health.cache_entries, 0);

    store.set_offline(true);
    assert!(!gateway.health().durable_store);
}

#[test]
fn builder_rejects_bad_settings() {
    assert!(Gateway::builder().model("  ").build().is_err());
    assert!(Gateway::builder().max_temperature(1.5).build().is_err());
}
