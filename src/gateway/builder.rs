//! Builder for configuring gateway instances

use std::sync::Arc;

use tracing::{info, warn};

use super::orchestrator::{Gateway, GatewaySettings};
use crate::cache::{CacheConfig, CacheStore, DEFAULT_PREFIX_CHARS};
use crate::config::{GatewayConfig, Secrets};
use crate::logging::{DurableStore, InteractionLogger, LoggerConfig, PostgrestStore};
use crate::providers::anthropic::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::providers::{AnthropicClient, ChatProvider, RetryConfig, RetryingProviderClient};
use crate::{GatewayError, Result};

/// Builder for configuring gateway instances.
///
/// Without a provider credential the gateway answers every call with
/// [`MockResponder`](super::MockResponder) output.
///
/// ```rust
/// # use tutorgate::Gateway;
/// let gateway = Gateway::builder().model("claude-test").build().unwrap();
/// assert!(!gateway.is_live());
/// ```
pub struct GatewayBuilder {
    model: String,
    anthropic_key: Option<String>,
    anthropic_base_url: String,
    provider: Option<Arc<dyn ChatProvider>>,
    retry: RetryConfig,
    cache: Option<Arc<CacheStore>>,
    cache_config: CacheConfig,
    store: Option<Arc<dyn DurableStore>>,
    logger_config: LoggerConfig,
    max_temperature: f32,
    prefix_chars: usize,
    history_limit: usize,
}

impl GatewayBuilder {
    pub fn new() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            anthropic_key: None,
            anthropic_base_url: DEFAULT_BASE_URL.to_string(),
            provider: None,
            retry: RetryConfig::default(),
            cache: None,
            cache_config: CacheConfig::default(),
            store: None,
            logger_config: LoggerConfig::default(),
            max_temperature: 0.6,
            prefix_chars: DEFAULT_PREFIX_CHARS,
            history_limit: 8,
        }
    }

    /// Start from a loaded configuration and environment secrets.
    ///
    /// A durable store is attached when both store credentials are present.
    pub fn from_config(config: &GatewayConfig, secrets: &Secrets) -> Result<Self> {
        let mut builder = Self::new()
            .model(config.provider.model.clone())
            .anthropic_base_url(config.provider.base_url.clone())
            .retry(config.retry_config())
            .cache_config(config.cache_config())
            .logger_config(config.logger_config())
            .max_temperature(config.cache.max_temperature)
            .system_prompt_prefix_chars(config.cache.system_prompt_prefix_chars)
            .history_limit(config.history.max_messages);

        if let Some(key) = &secrets.anthropic_api_key {
            builder = builder.anthropic(key.clone());
        }
        if let Some((url, key)) = secrets.store_credentials() {
            builder = builder.store(Arc::new(PostgrestStore::new(url, key)?));
        }
        Ok(builder)
    }

    /// Model requested from the provider.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Configure the Anthropic provider.
    pub fn anthropic(mut self, api_key: impl Into<String>) -> Self {
        self.anthropic_key = Some(api_key.into());
        self
    }

    /// Override the Anthropic API base URL.
    pub fn anthropic_base_url(mut self, url: impl Into<String>) -> Self {
        self.anthropic_base_url = url.into();
        self
    }

    /// Use a custom provider. Takes precedence over [`anthropic`](Self::anthropic).
    pub fn provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    pub fn cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    /// Share an existing cache instead of creating one.
    pub fn cache(mut self, cache: Arc<CacheStore>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Durable store for interaction records.
    pub fn store(mut self, store: Arc<dyn DurableStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn logger_config(mut self, config: LoggerConfig) -> Self {
        self.logger_config = config;
        self
    }

    /// Requests above this temperature bypass the cache.
    pub fn max_temperature(mut self, temperature: f32) -> Self {
        self.max_temperature = temperature;
        self
    }

    /// Characters of the system prompt that feed the cache key.
    pub fn system_prompt_prefix_chars(mut self, chars: usize) -> Self {
        self.prefix_chars = chars;
        self
    }

    /// Most recent history entries considered for forwarding.
    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Build the gateway.
    ///
    /// Must be called inside a tokio runtime for interaction records to
    /// reach the durable store; outside one they stay in memory.
    pub fn build(self) -> Result<Gateway> {
        if self.model.trim().is_empty() {
            return Err(GatewayError::Configuration("model name is empty".into()));
        }
        if !(0.0..=1.0).contains(&self.max_temperature) {
            return Err(GatewayError::Configuration(format!(
                "max_temperature must be within 0.0..=1.0, got {}",
                self.max_temperature
            )));
        }
        if !(self.cache_config.prune_fraction > 0.0 && self.cache_config.prune_fraction <= 1.0) {
            return Err(GatewayError::Configuration(format!(
                "prune_fraction must be within (0.0, 1.0], got {}",
                self.cache_config.prune_fraction
            )));
        }

        let provider: Option<Arc<dyn ChatProvider>> = match (self.provider, self.anthropic_key) {
            (Some(provider), _) => Some(provider),
            (None, Some(key)) => Some(Arc::new(AnthropicClient::with_base_url(
                key,
                self.anthropic_base_url,
            )?)),
            (None, None) => None,
        };

        let provider = match provider {
            Some(provider) => {
                info!(provider = provider.name(), model = %self.model, "live provider configured");
                Some(RetryingProviderClient::new(provider, self.retry))
            }
            None => {
                warn!("no provider credential configured, answering with mock responses");
                None
            }
        };

        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(CacheStore::new(self.cache_config)));
        let logger = InteractionLogger::new(self.store, self.logger_config);

        Ok(Gateway::new(
            provider,
            cache,
            logger,
            GatewaySettings {
                model: self.model,
                max_temperature: self.max_temperature,
                prefix_chars: self.prefix_chars,
                history_limit: self.history_limit,
            },
        ))
    }
}

impl Default for GatewayBuilder {
    fn default() -> Self {
        Self::new()
    }
}
