//! Public types for the gateway API.

mod message;
mod metadata;
mod provider;
mod record;
mod request;
mod response;
mod tool;

pub use message::{ChatMessage, Role};
pub use metadata::{Metadata, MetadataValue};
pub use provider::{ProviderReply, ProviderRequest};
pub use record::{InteractionRecord, UNKNOWN_PHASE};
pub use request::{Correlation, GatewayRequest};
pub use response::{GatewayResponse, Usage};
pub use tool::{ToolCall, ToolDefinition, ToolInput, first_tool_input};
