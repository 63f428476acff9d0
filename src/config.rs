//! Configuration loading.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. an explicit path (CLI flag)
//! 2. `~/.tutorgate/config.toml` (user)
//! 3. `/etc/tutorgate/config.toml` (system)
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Secrets never live in the file; see [`Secrets`].

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::{CacheConfig, DEFAULT_PREFIX_CHARS};
use crate::logging::LoggerConfig;
use crate::providers::RetryConfig;
use crate::providers::anthropic::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::{GatewayError, Result};

/// Gateway configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub retry: RetrySection,
    #[serde(default)]
    pub history: HistorySection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// LLM provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Model requested from the provider.
    #[serde(default = "default_model")]
    pub model: String,
    /// Provider API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_prune_fraction")]
    pub prune_fraction: f64,
    /// Requests above this temperature bypass the cache (default: 0.6).
    #[serde(default = "default_max_temperature")]
    pub max_temperature: f32,
    /// Characters of the system prompt that feed the cache key (default: 800).
    #[serde(default = "default_prefix_chars")]
    pub system_prompt_prefix_chars: usize,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_entries: default_max_entries(),
            prune_fraction: default_prune_fraction(),
            max_temperature: default_max_temperature(),
            system_prompt_prefix_chars: default_prefix_chars(),
        }
    }
}

fn default_ttl_secs() -> u64 {
    1200
}

fn default_max_entries() -> usize {
    150
}

fn default_prune_fraction() -> f64 {
    0.1
}

fn default_max_temperature() -> f32 {
    0.6
}

fn default_prefix_chars() -> usize {
    DEFAULT_PREFIX_CHARS
}

/// Retry settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_step_secs")]
    pub backoff_step_secs: u64,
    #[serde(default = "default_max_backoff_secs")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_attempt_timeout_secs")]
    pub attempt_timeout_secs: u64,
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            backoff_step_secs: default_backoff_step_secs(),
            max_backoff_secs: default_max_backoff_secs(),
            attempt_timeout_secs: default_attempt_timeout_secs(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_step_secs() -> u64 {
    2
}

fn default_max_backoff_secs() -> u64 {
    10
}

fn default_attempt_timeout_secs() -> u64 {
    80
}

/// Chat history forwarding.
#[derive(Debug, Clone, Deserialize)]
pub struct HistorySection {
    /// Most recent history entries considered for forwarding (default: 8).
    #[serde(default = "default_max_messages")]
    pub max_messages: usize,
}

impl Default for HistorySection {
    fn default() -> Self {
        Self {
            max_messages: default_max_messages(),
        }
    }
}

fn default_max_messages() -> usize {
    8
}

/// Interaction logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_fallback_capacity")]
    pub fallback_capacity: usize,
    #[serde(default = "default_persist_attempts")]
    pub persist_attempts: u32,
}

impl Default for LoggingSection {
    fn default() -> Self {
        let defaults = LoggerConfig::default();
        Self {
            table: defaults.table,
            queue_capacity: defaults.queue_capacity,
            fallback_capacity: defaults.fallback_capacity,
            persist_attempts: defaults.persist_attempts,
        }
    }
}

fn default_table() -> String {
    LoggerConfig::default().table
}

fn default_queue_capacity() -> usize {
    LoggerConfig::default().queue_capacity
}

fn default_fallback_capacity() -> usize {
    LoggerConfig::default().fallback_capacity
}

fn default_persist_attempts() -> u32 {
    LoggerConfig::default().persist_attempts
}

impl GatewayConfig {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.tutorgate/config.toml`
    /// 3. `/etc/tutorgate/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?.ok_or_else(|| {
            GatewayError::Configuration(
                "No config file found. Create ~/.tutorgate/config.toml or /etc/tutorgate/config.toml"
                    .to_string(),
            )
        })?;
        Self::load_from_file(&path)
    }

    /// Like [`load`](Self::load), but falls back to defaults when no file
    /// exists in the standard locations. An explicit path must still exist.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| GatewayError::Configuration(format!("Failed to parse config: {e}")))
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            GatewayError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            GatewayError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(GatewayError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".tutorgate").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/tutorgate/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig::new()
            .ttl(Duration::from_secs(self.cache.ttl_secs))
            .max_entries(self.cache.max_entries)
            .prune_fraction(self.cache.prune_fraction)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .max_retries(self.retry.max_retries)
            .backoff_step(Duration::from_secs(self.retry.backoff_step_secs))
            .max_backoff(Duration::from_secs(self.retry.max_backoff_secs))
            .attempt_timeout(Duration::from_secs(self.retry.attempt_timeout_secs))
    }

    pub fn logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            table: self.logging.table.clone(),
            queue_capacity: self.logging.queue_capacity,
            fallback_capacity: self.logging.fallback_capacity,
            persist_attempts: self.logging.persist_attempts,
        }
    }
}

/// Environment variable holding the provider API key.
pub const ANTHROPIC_KEY_ENV_VAR: &str = "ANTHROPIC_API_KEY";

/// Credentials, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    pub anthropic_api_key: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_key: Option<String>,
}

impl Secrets {
    /// Read `ANTHROPIC_API_KEY`, `SUPABASE_URL` and `SUPABASE_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read secrets through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            anthropic_api_key: get(ANTHROPIC_KEY_ENV_VAR),
            supabase_url: get(crate::logging::postgrest::URL_ENV_VAR),
            supabase_key: get(crate::logging::postgrest::KEY_ENV_VAR),
        }
    }

    /// Both halves of the durable store credential, if present.
    pub fn store_credentials(&self) -> Option<(&str, &str)> {
        Some((self.supabase_url.as_deref()?, self.supabase_key.as_deref()?))
    }
}
