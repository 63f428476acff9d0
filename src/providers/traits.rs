//! Provider trait.
//!
//! A provider performs exactly one attempt per [`ChatProvider::send`] call.
//! Deadlines and retries live in
//! [`RetryingProviderClient`](super::RetryingProviderClient), so
//! implementations only need to report failures with the right
//! [`GatewayError`](crate::GatewayError) variant:
//!
//! - `Timeout` for transport deadlines,
//! - `Connection` for network and transport failures,
//! - anything else for API-level failures.

use async_trait::async_trait;

use crate::Result;
use crate::types::{ProviderReply, ProviderRequest};

/// A single external LLM provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Perform one call.
    async fn send(&self, request: &ProviderRequest) -> Result<ProviderReply>;
}
