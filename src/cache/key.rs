//! Fuzzy cache key derivation.
//!
//! The key deliberately ignores most of the request so that near-duplicate
//! requests collapse onto one entry:
//!
//! - only the first `prefix_chars` characters of the system prompt,
//! - the user message with surrounding whitespace trimmed,
//! - the serialized tool list (empty when there are no tools),
//! - only the **last** history entry, not the whole history.
//!
//! Temperature, max tokens and correlation identifiers never participate.

use std::fmt;

use sha2::{Digest, Sha256};

use crate::types::GatewayRequest;

/// Default number of system prompt characters that participate in the key.
pub const DEFAULT_PREFIX_CHARS: usize = 800;

/// Hex-encoded SHA-256 digest of the fuzzy view of a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a request using `prefix_chars` characters of the
    /// system prompt.
    pub fn derive(request: &GatewayRequest, prefix_chars: usize) -> Self {
        let system_prefix: String = request.system_prompt.chars().take(prefix_chars).collect();

        let tools = if request.tools.is_empty() {
            String::new()
        } else {
            serde_json::to_string(&request.tools).unwrap_or_default()
        };

        let last_turn = match request.history.len() {
            0 => String::new(),
            n => serde_json::to_string(&request.history[n - 1..]).unwrap_or_default(),
        };

        let mut hasher = Sha256::new();
        hasher.update(system_prefix.as_bytes());
        hasher.update(request.user_message.trim().as_bytes());
        hasher.update(tools.as_bytes());
        hasher.update(last_turn.as_bytes());
        CacheKey(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First eight hex digits, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..8.min(self.0.len())]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        CacheKey(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_hex_sha256() {
        let key = CacheKey::derive(&GatewayRequest::new("s", "u"), DEFAULT_PREFIX_CHARS);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(key.short().len(), 8);
    }

    #[test]
    fn prefix_counts_characters_not_bytes() {
        let base = "é".repeat(10);
        let a = GatewayRequest::new(format!("{base}a-tail"), "u");
        let b = GatewayRequest::new(format!("{base}b-tail"), "u");
        assert_eq!(CacheKey::derive(&a, 10), CacheKey::derive(&b, 10));
        assert_ne!(CacheKey::derive(&a, 11), CacheKey::derive(&b, 11));
    }
}
