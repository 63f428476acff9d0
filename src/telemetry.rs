//! Telemetry metric name constants.
//!
//! Centralised metric names for gateway operations. Consumers install
//! their own `metrics` recorder (e.g. prometheus, statsd); without a
//! recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `tutorgate_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `path`: how a request was answered: "cache_hit", "mock", "live" or "failed"
//! - `class`: failure class: "timeout", "connection" or "other"
//! - `direction`: token direction: "input" or "output"
//! - `tier`: logging tier a record landed in: "durable" or "fallback"

/// Total gateway calls.
///
/// Labels: `path`.
pub const REQUESTS_TOTAL: &str = "tutorgate_requests_total";

/// Gateway call duration in seconds, cache hits included.
///
/// Labels: `path`.
pub const REQUEST_DURATION_SECONDS: &str = "tutorgate_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`, `class`.
pub const RETRIES_TOTAL: &str = "tutorgate_retries_total";

/// Total tokens reported by the provider (or estimated for mocks).
///
/// Labels: `direction`.
pub const TOKENS_TOTAL: &str = "tutorgate_tokens_total";

/// Total response cache hits.
pub const CACHE_HITS_TOTAL: &str = "tutorgate_cache_hits_total";

/// Total response cache misses, expired entries included.
pub const CACHE_MISSES_TOTAL: &str = "tutorgate_cache_misses_total";

/// Total entries removed by size-triggered pruning.
pub const CACHE_EVICTIONS_TOTAL: &str = "tutorgate_cache_evictions_total";

/// Total interaction records written, by tier.
///
/// Labels: `tier`.
pub const INTERACTIONS_LOGGED_TOTAL: &str = "tutorgate_interactions_logged_total";

/// Total fallback records discarded because the fallback tier was full.
pub const FALLBACK_OVERFLOW_TOTAL: &str = "tutorgate_fallback_overflow_total";
