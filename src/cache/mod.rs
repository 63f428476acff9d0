//! Response caching.
//!
//! - [`key::CacheKey`]: fuzzy digest of a request; near-duplicate requests
//!   share a key on purpose.
//! - [`store::CacheStore`]: bounded, TTL'd store of raw provider replies
//!   with oldest-first batch pruning.
//!
//! Only requests at or below the gateway's cache temperature (0.6 by
//! default) ever read from or write to the store; the gateway enforces that
//! before touching it.

pub mod key;
pub mod store;

pub use key::{CacheKey, DEFAULT_PREFIX_CHARS};
pub use store::{CacheConfig, CacheEntry, CacheStore};
