use std::io::Write;
use std::time::Duration;

use tutorgate::{GatewayBuilder, GatewayConfig, Secrets};

#[test]
fn load_explicit_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [provider]
        model = "claude-haiku-test"

        [cache]
        ttl_secs = 300
        max_entries = 40
        max_temperature = 0.5

        [retry]
        max_retries = 2
        attempt_timeout_secs = 30

        [history]
        max_messages = 4

        [logging]
        table = "llm_interactions_dev"
        fallback_capacity = 50
        "#
    )
    .unwrap();

    let config = GatewayConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.provider.model, "claude-haiku-test");
    assert_eq!(config.cache.max_temperature, 0.5);
    assert_eq!(config.history.max_messages, 4);

    let cache = config.cache_config();
    assert_eq!(cache.ttl, Duration::from_secs(300));
    assert_eq!(cache.prune_count(), 4);

    let retry = config.retry_config();
    assert_eq!(retry.total_attempts(), 3);
    assert_eq!(retry.attempt_timeout, Duration::from_secs(30));
    assert_eq!(retry.delay_for_attempt(1), Duration::from_secs(2));

    let logger = config.logger_config();
    assert_eq!(logger.table, "llm_interactions_dev");
    assert_eq!(logger.fallback_capacity, 50);
    assert_eq!(logger.queue_capacity, 256);
}

#[test]
fn empty_file_is_all_defaults() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let config = GatewayConfig::load(Some(file.path())).unwrap();
    assert_eq!(config.cache.ttl_secs, 1200);
    assert_eq!(config.retry.max_retries, 3);
}

#[test]
fn missing_explicit_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.toml");
    assert!(GatewayConfig::load(Some(&missing)).is_err());
    assert!(GatewayConfig::load_or_default(Some(&missing)).is_err());
}

#[test]
fn malformed_file_is_an_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[cache]\nttl_secs = \"soon\"").unwrap();
    let err = GatewayConfig::load(Some(file.path())).unwrap_err();
    assert!(err.to_string().contains("Failed to parse"));
}

#[test]
fn builder_without_credential_is_mock() {
    let config = GatewayConfig::default();
    let gateway = GatewayBuilder::from_config(&config, &Secrets::default())
        .unwrap()
        .build()
        .unwrap();
    assert!(!gateway.is_live());
    assert!(gateway.health().is_mock());
}

#[test]
fn builder_with_credential_is_live() {
    let config = GatewayConfig::from_toml_str("[provider]\nmodel = \"claude-x\"").unwrap();
    let secrets = Secrets::from_lookup(|name| {
        (name == "ANTHROPIC_API_KEY").then(|| "sk-ant-test".to_string())
    });
    let gateway = GatewayBuilder::from_config(&config, &secrets)
        .unwrap()
        .build()
        .unwrap();
    assert!(gateway.is_live());
    assert_eq!(gateway.model(), "claude-x");
    assert_eq!(gateway.health().provider.as_deref(), Some("anthropic"));
}

#[tokio::test]
async fn store_credentials_attach_durable_store() {
    let secrets = Secrets::from_lookup(|name| match name {
        "SUPABASE_URL" => Some("http://127.0.0.1:1".to_string()),
        "SUPABASE_KEY" => Some("service-key".to_string()),
        _ => None,
    });
    let gateway = GatewayBuilder::from_config(&GatewayConfig::default(), &secrets)
        .unwrap()
        .build()
        .unwrap();
    assert!(gateway.health().durable_store);
}
