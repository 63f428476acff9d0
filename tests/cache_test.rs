use std::sync::Arc;
use std::time::Duration;

use tutorgate::cache::{CacheConfig, CacheKey, CacheStore, DEFAULT_PREFIX_CHARS};
use tutorgate::{ChatMessage, GatewayRequest, ProviderReply, ToolDefinition};

fn reply(content: &str) -> ProviderReply {
    ProviderReply {
        content: content.to_string(),
        model: "claude-test".to_string(),
        ..Default::default()
    }
}

fn key(request: &GatewayRequest) -> CacheKey {
    CacheKey::derive(request, DEFAULT_PREFIX_CHARS)
}

// ============================================================================
// Key derivation
// ============================================================================

#[test]
fn key_ignores_system_prompt_past_prefix() {
    let base = "s".repeat(DEFAULT_PREFIX_CHARS);
    let a = GatewayRequest::new(format!("{base} rubric A"), "question");
    let b = GatewayRequest::new(format!("{base} rubric B"), "question");
    assert_eq!(key(&a), key(&b));

    let c = GatewayRequest::new("different prompt", "question");
    assert_ne!(key(&a), key(&c));
}

#[test]
fn key_trims_user_message() {
    let a = GatewayRequest::new("sys", "  What is a limit?\n");
    let b = GatewayRequest::new("sys", "What is a limit?");
    assert_eq!(key(&a), key(&b));
}

#[test]
fn key_uses_only_last_history_entry() {
    let a = GatewayRequest::new("sys", "next").history(vec![
        ChatMessage::user("first version"),
        ChatMessage::assistant("shared reply"),
    ]);
    let b = GatewayRequest::new("sys", "next").history(vec![
        ChatMessage::user("completely different opener"),
        ChatMessage::user("and another turn"),
        ChatMessage::assistant("shared reply"),
    ]);
    assert_eq!(key(&a), key(&b));

    let c = GatewayRequest::new("sys", "next").history(vec![ChatMessage::assistant("other reply")]);
    assert_ne!(key(&a), key(&c));

    let none = GatewayRequest::new("sys", "next");
    assert_ne!(key(&a), key(&none));
}

#[test]
fn key_includes_tools() {
    let plain = GatewayRequest::new("sys", "msg");
    let tool = ToolDefinition::new(
        "evaluate_response",
        "Score the answer",
        serde_json::json!({"type": "object"}),
    );
    let with_tools = plain.clone().tools(vec![tool]);
    assert_ne!(key(&plain), key(&with_tools));
}

#[test]
fn key_ignores_sampling_and_correlation() {
    let a = GatewayRequest::new("sys", "msg").temperature(0.1).user_id("a");
    let b = GatewayRequest::new("sys", "msg")
        .temperature(0.5)
        .max_tokens(10)
        .user_id("b")
        .phase("3");
    assert_eq!(key(&a), key(&b));
}

// ============================================================================
// Expiry
// ============================================================================

#[tokio::test(start_paused = true)]
async fn entry_expires_at_ttl_and_is_removed_on_read() {
    let store = CacheStore::new(CacheConfig::new().ttl(Duration::from_secs(1200)));
    let k = CacheKey::from("k");
    store.put(k.clone(), reply("cached"));

    tokio::time::advance(Duration::from_secs(1199)).await;
    assert_eq!(store.get(&k).unwrap().response.content, "cached");

    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(store.get(&k).is_none());
    assert_eq!(store.len(), 0, "expired entry removed by the lookup");
}

#[tokio::test(start_paused = true)]
async fn overwrite_restarts_ttl() {
    let store = CacheStore::new(CacheConfig::new().ttl(Duration::from_secs(10)));
    let k = CacheKey::from("k");
    store.put(k.clone(), reply("one"));
    tokio::time::advance(Duration::from_secs(8)).await;
    store.put(k.clone(), reply("two"));
    tokio::time::advance(Duration::from_secs(8)).await;
    assert_eq!(store.get(&k).unwrap().response.content, "two");
}

// ============================================================================
// Pruning
// ============================================================================

#[tokio::test(start_paused = true)]
async fn overflow_evicts_oldest_batch() {
    let store = CacheStore::new(CacheConfig::new().max_entries(20));
    for i in 0..20 {
        assert_eq!(store.put(format!("k{i}").as_str().into(), reply("x")), 0);
        tokio::time::advance(Duration::from_secs(1)).await;
    }

    let evicted = store.put("k20".into(), reply("x"));
    assert_eq!(evicted, 2, "ceil(20 * 0.1) entries go at once");
    assert_eq!(store.len(), 19);
    assert!(!store.contains(&"k0".into()));
    assert!(!store.contains(&"k1".into()));
    assert!(store.contains(&"k2".into()));
    assert!(store.contains(&"k20".into()));
}

#[tokio::test(start_paused = true)]
async fn default_limit_prunes_fifteen() {
    let store = CacheStore::default();
    for i in 0..150 {
        store.put(format!("k{i}").as_str().into(), reply("x"));
        tokio::time::advance(Duration::from_millis(10)).await;
    }
    assert_eq!(store.len(), 150);

    assert_eq!(store.put("one-more".into(), reply("x")), 15);
    assert_eq!(store.len(), 136);
    assert!(!store.contains(&"k14".into()));
    assert!(store.contains(&"k15".into()));
}

#[tokio::test(start_paused = true)]
async fn overwriting_an_old_key_refreshes_its_age() {
    let store = CacheStore::new(CacheConfig::new().max_entries(3));
    for name in ["a", "b", "c"] {
        store.put(name.into(), reply("x"));
        tokio::time::advance(Duration::from_secs(1)).await;
    }
    store.put("a".into(), reply("fresh"));
    tokio::time::advance(Duration::from_secs(1)).await;
    store.put("d".into(), reply("x"));

    assert!(store.contains(&"a".into()));
    assert!(!store.contains(&"b".into()));
}

// ============================================================================
// Concurrency
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_access_stays_bounded() {
    let store = Arc::new(CacheStore::new(CacheConfig::new().max_entries(50)));

    let mut handles = Vec::new();
    for task in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            for i in 0..200 {
                let k = CacheKey::from(format!("t{task}-{i}").as_str());
                store.put(k.clone(), reply("x"));
                assert!(store.len() <= 50);
                let _ = store.get(&k);
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(store.len() <= 50);
    assert!(!store.is_empty());
}
