//! LLM provider access.
//!
//! - [`traits::ChatProvider`]: the seam between the gateway and a provider.
//! - [`anthropic::AnthropicClient`]: HTTP client for the Anthropic Messages API.
//! - [`retry::RetryingProviderClient`]: per-attempt deadline, failure
//!   classification and capped linear backoff around any `ChatProvider`.

pub mod anthropic;
pub mod retry;
pub mod traits;

pub use anthropic::AnthropicClient;
pub use retry::{RetryConfig, RetryingProviderClient};
pub use traits::ChatProvider;
