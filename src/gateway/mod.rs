//! Gateway orchestration

mod builder;
mod orchestrator;
pub mod mock;

pub use builder::GatewayBuilder;
pub use orchestrator::{Gateway, HealthReport};
pub use mock::MockResponder;
