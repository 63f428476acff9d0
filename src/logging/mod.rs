//! Tiered interaction logging.
//!
//! - [`store::DurableStore`]: the seam to a relational store, with
//!   [`store::MemoryStore`] and [`postgrest::PostgrestStore`] implementations.
//! - [`fallback::FallbackLog`]: bounded in-process tier.
//! - [`logger::InteractionLogger`]: queue plus background writer tying the
//!   two together.

pub mod fallback;
pub mod logger;
pub mod postgrest;
pub mod store;

pub use fallback::FallbackLog;
pub use logger::{InteractionLogger, LoggerConfig};
pub use postgrest::PostgrestStore;
pub use store::{DurableStore, MemoryStore};
