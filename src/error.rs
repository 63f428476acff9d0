//! Gateway error types and the provider failure taxonomy.

use std::fmt;
use std::time::Duration;

/// Gateway error types
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    // Provider/network errors
    #[error("provider call timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("authentication failed")]
    AuthenticationFailed,

    // Configuration errors
    /// No provider credential is configured. The gateway answers with mock
    /// responses in this state; this variant only surfaces from code that
    /// explicitly requires a live provider.
    #[error("no provider credential configured")]
    NoCredential,

    #[error("configuration error: {0}")]
    Configuration(String),

    // Logging tier
    #[error("storage error: {0}")]
    Storage(String),

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GatewayError {
    /// Map this error onto the retry taxonomy.
    pub fn failure_class(&self) -> FailureClass {
        match self {
            GatewayError::Timeout(_) => FailureClass::Timeout,
            GatewayError::Connection(_) => FailureClass::Connection,
            _ => FailureClass::Other,
        }
    }

    /// Whether a repeat of the same operation has a reasonable chance of
    /// succeeding. Used by the interaction logger when writing to the store.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Timeout(_)
            | GatewayError::Connection(_)
            | GatewayError::RateLimited { .. } => true,
            GatewayError::Api { status, .. } => matches!(status, 500 | 502 | 503 | 504 | 529),
            _ => false,
        }
    }
}

/// Classification of a failed provider attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureClass {
    /// The per-attempt deadline elapsed.
    Timeout,
    /// Network or transport-level failure.
    Connection,
    /// Anything else the provider reported (bad request, rate limit, 5xx).
    Other,
}

impl FailureClass {
    /// Stable error code placed in [`GatewayResponse::error`](crate::GatewayResponse::error).
    pub fn error_code(self) -> &'static str {
        match self {
            FailureClass::Timeout => "timeout_after_retries",
            FailureClass::Connection => "connection_issues",
            FailureClass::Other => "provider_error",
        }
    }

    /// Apology shown to the end user when retries are exhausted.
    pub fn user_message(self) -> &'static str {
        match self {
            FailureClass::Timeout => TIMEOUT_MESSAGE,
            FailureClass::Connection => CONNECTION_MESSAGE,
            FailureClass::Other => OTHER_MESSAGE,
        }
    }

    /// Short label for logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::Timeout => "timeout",
            FailureClass::Connection => "connection",
            FailureClass::Other => "other",
        }
    }

    /// Raw-response marker recorded in the interaction log for a failure
    /// of this class.
    pub(crate) fn log_marker(self, message: &str) -> String {
        match self {
            FailureClass::Timeout => "TIMEOUT".to_string(),
            FailureClass::Connection => format!("CONNECTION_ERROR: {message}"),
            FailureClass::Other => format!("ERROR: {message}"),
        }
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const TIMEOUT_MESSAGE: &str = "I'm taking longer than usual to provide feedback on your response. \
This often happens with complex work that needs careful analysis.\n\n\
**Your work has been saved** and you can:\n\n\
1. **Try again** - Click the retry button to get your feedback\n\
2. **Continue anyway** - Your responses are saved and you can move on to the next task\n\
3. **Simplify your response** - A more concise answer may be reviewed faster\n\n\
Your learning progress is not lost.";

const CONNECTION_MESSAGE: &str = "I'm experiencing connectivity issues while trying to provide \
feedback on your work.\n\n\
**Your work is safely saved** and you have these options:\n\n\
1. **Try again** - Connectivity issues often resolve quickly\n\
2. **Wait a moment** - The service may need a minute to stabilize\n\
3. **Continue to the next task** - Your responses are preserved and you can return for feedback later\n\n\
This is a temporary technical issue and doesn't affect your learning progress.";

const OTHER_MESSAGE: &str = "I'm having trouble processing your request right now. \
Your work has been saved, please try again in a moment.";

/// Outcome of a provider call whose retries were exhausted.
///
/// Carries the class and message of the last failed attempt. Never raised
/// past the gateway; it is converted into a user-safe
/// [`GatewayResponse`](crate::GatewayResponse).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{class} failure after {attempts} attempt(s): {message}")]
pub struct ProviderFailure {
    pub class: FailureClass,
    pub message: String,
    pub attempts: u32,
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_markers() {
        assert_eq!(FailureClass::Timeout.log_marker("x"), "TIMEOUT");
        assert_eq!(
            FailureClass::Connection.log_marker("reset"),
            "CONNECTION_ERROR: reset"
        );
        assert_eq!(FailureClass::Other.log_marker("bad"), "ERROR: bad");
    }
}
