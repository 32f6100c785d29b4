//! Server-reported rate-limit state
//!
//! OpsGenie tells clients how close they are to their quota through the
//! `X-RateLimit-State` response header. The value is advisory: the client
//! reports it back to the caller and never throttles on its own.
//!
//! # Example
//!
//! ```rust
//! use opsgenie_core::rate_limit::RateLimitState;
//!
//! let state = RateLimitState::from_header("THROTTLED");
//! assert!(state.is_throttled());
//! assert_eq!(state.as_str(), "THROTTLED");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Rate-limit posture advertised by the service
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RateLimitState {
    /// Header absent or empty
    #[default]
    Unknown,
    /// Well within quota
    Normal,
    /// Quota exhausted; further calls are likely to get 429s
    Throttled,
    /// Any value this client does not know about, kept verbatim
    Other(String),
}

impl RateLimitState {
    /// Classify a raw header value (case-insensitive)
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::Unknown;
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "NORMAL" => Self::Normal,
            "THROTTLED" => Self::Throttled,
            _ => Self::Other(trimmed.to_string()),
        }
    }

    /// Whether the service asked the client to slow down
    #[must_use]
    pub fn is_throttled(&self) -> bool {
        matches!(self, Self::Throttled)
    }

    /// Wire representation
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unknown => "",
            Self::Normal => "NORMAL",
            Self::Throttled => "THROTTLED",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for RateLimitState {
    fn from(value: &str) -> Self {
        Self::from_header(value)
    }
}

impl fmt::Display for RateLimitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
