//! tutorgate - LLM request gateway for an educational chat backend
//!
//! Every call to the external model goes through a [`Gateway`], which
//!
//! - serves near-duplicate low-temperature requests from a bounded, TTL'd
//!   [`CacheStore`](cache::CacheStore);
//! - retries failed provider calls with a per-attempt deadline and capped
//!   linear backoff, turning exhausted retries into an apology response;
//! - answers with deterministic mock output when no provider credential
//!   is configured;
//! - splits the `INSTRUCTOR_METADATA` block off model output
//!   ([`metadata`]);
//! - logs every interaction to a durable store, falling back to a bounded
//!   in-memory tier ([`logging`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use tutorgate::{Gateway, GatewayRequest};
//!
//! #[tokio::main]
//! async fn main() -> tutorgate::Result<()> {
//!     let gateway = Gateway::builder()
//!         .anthropic("sk-ant-your-key")
//!         .build()?;
//!
//!     let response = gateway
//!         .call(GatewayRequest::new("You are a tutor.", "Explain derivatives.").phase("2"))
//!         .await;
//!
//!     println!("{}", response.content);
//!     if let Some(score) = response.metadata.get("overall_score") {
//!         println!("score: {score}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod logging;
pub mod metadata;
pub mod providers;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use config::{GatewayConfig, Secrets};
pub use error::{FailureClass, GatewayError, ProviderFailure, Result};
pub use gateway::{Gateway, GatewayBuilder, HealthReport, MockResponder};
pub use providers::{ChatProvider, RetryConfig, RetryingProviderClient};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    ChatMessage, Correlation, GatewayRequest, GatewayResponse, InteractionRecord, Metadata,
    MetadataValue, ProviderReply, ProviderRequest, Role, ToolCall, ToolDefinition, ToolInput,
    Usage, first_tool_input,
};
