//! Error classification shared by the OpsGenie client crates
//!
//! The transport crate owns the rich error enum (it carries `reqwest` and
//! `serde_json` sources). This module holds the stable part of that
//! taxonomy: a code per failure kind that callers can log, serialize and
//! branch on without matching transport variants.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Configuration errors (1xxx)
    ConfigError = 1000,
    MissingEnvVar = 1001,

    // Validation errors (2xxx)
    ValidationError = 2000,

    // Request build errors (3xxx)
    BuildError = 3000,
    SerializationError = 3001,

    // Transport errors (4xxx)
    TransportError = 4000,

    // Context errors (5xxx)
    Canceled = 5000,
    DeadlineExceeded = 5001,

    // API errors (6xxx)
    ApiResponse = 6000,

    // Parse errors (7xxx)
    ParseError = 7000,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "Configuration",
            2 => "Validation",
            3 => "Build",
            4 => "Transport",
            5 => "Context",
            6 => "Api",
            7 => "Parse",
            _ => "Unknown",
        }
    }

    /// Whether the failure happened before anything was sent
    pub fn is_local(&self) -> bool {
        matches!(self.code() / 1000, 1..=3)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}
