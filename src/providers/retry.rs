//! Retry configuration, delay calculation, and the retrying client.
//!
//! [`RetryingProviderClient`] wraps any [`ChatProvider`] and owns three
//! concerns the provider itself does not:
//!
//! - a hard deadline on **each** attempt (not on the call as a whole);
//! - classification of every failure into a [`FailureClass`](crate::FailureClass);
//! - waiting `min(step * n, max)` after the n-th failure before trying again.
//!
//! An attempt that overruns its deadline is dropped, which cancels the
//! in-flight HTTP request rather than leaving it running in the background.
//!
//! Exhausted retries are not an `Err` of [`GatewayError`](crate::GatewayError):
//! they come back as a [`ProviderFailure`] the gateway turns into a user-safe
//! response.

use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use super::traits::ChatProvider;
use crate::error::{GatewayError, ProviderFailure};
use crate::telemetry;
use crate::types::{ProviderReply, ProviderRequest};

/// Configuration for retry behaviour.
///
/// ```rust
/// # use tutorgate::RetryConfig;
/// # use std::time::Duration;
/// let config = RetryConfig::new()
///     .max_retries(2)
///     .attempt_timeout(Duration::from_secs(30));
/// assert_eq!(config.delay_for_attempt(1), Duration::from_secs(2));
/// assert_eq!(config.delay_for_attempt(9), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the initial attempt. 0 = no retry. Default: 3.
    pub max_retries: u32,
    /// Backoff grows by this much per failed attempt. Default: 2s.
    pub backoff_step: Duration,
    /// Upper bound on a single backoff. Default: 10s.
    pub max_backoff: Duration,
    /// Deadline for each individual attempt. Default: 80s.
    pub attempt_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_step: Duration::from_secs(2),
            max_backoff: Duration::from_secs(10),
            attempt_timeout: Duration::from_secs(80),
        }
    }
}

impl RetryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// A config that makes a single attempt.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    pub fn backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    pub fn max_backoff(mut self, max: Duration) -> Self {
        self.max_backoff = max;
        self
    }

    pub fn attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    /// Total attempts including the first one.
    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Wait after the `failures`-th consecutive failure (1-based):
    /// `min(backoff_step * failures, max_backoff)`.
    pub fn delay_for_attempt(&self, failures: u32) -> Duration {
        self.backoff_step
            .saturating_mul(failures)
            .min(self.max_backoff)
    }
}

/// Decorator that wraps a [`ChatProvider`] with deadlines and retries.
#[derive(Clone)]
pub struct RetryingProviderClient {
    inner: Arc<dyn ChatProvider>,
    config: RetryConfig,
}

impl RetryingProviderClient {
    /// Wrap a provider with retry logic.
    pub fn new(inner: Arc<dyn ChatProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Call the provider until it succeeds or retries run out.
    pub async fn call(
        &self,
        request: &ProviderRequest,
    ) -> std::result::Result<ProviderReply, ProviderFailure> {
        let provider = self.inner.name();
        let mut failures = 0u32;

        loop {
            let outcome =
                match tokio::time::timeout(self.config.attempt_timeout, self.inner.send(request))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => Err(GatewayError::Timeout(self.config.attempt_timeout)),
                };

            let err = match outcome {
                Ok(reply) => return Ok(reply),
                Err(err) => err,
            };

            failures += 1;
            let class = err.failure_class();

            if failures > self.config.max_retries {
                warn!(
                    provider,
                    attempts = failures,
                    class = %class,
                    error = %err,
                    "provider call failed, retries exhausted"
                );
                return Err(ProviderFailure {
                    class,
                    message: err.to_string(),
                    attempts: failures,
                });
            }

            metrics::counter!(telemetry::RETRIES_TOTAL,
                "provider" => provider.to_owned(),
                "class" => class.as_str(),
            )
            .increment(1);

            let delay = self.config.delay_for_attempt(failures);
            warn!(
                provider,
                attempt = failures,
                max_retries = self.config.max_retries,
                class = %class,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying after failed provider call"
            );
            tokio::time::sleep(delay).await;
        }
    }
}
