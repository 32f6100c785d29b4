//! Transport-independent building blocks for the OpsGenie client
//!
//! This crate holds the pieces of the client that do not need an HTTP stack:
//!
//! - **Error codes**: Stable, serializable classification of every failure kind
//! - **Retry**: Exponential backoff with jitter and the retryable-status table
//! - **Rate limit**: Parsing of the server-reported `X-RateLimit-State`
//! - **Validation**: Fluent field checks used by request types
//!
//! # Example
//!
//! ```rust
//! use opsgenie_core::prelude::*;
//! use std::time::Duration;
//!
//! let backoff = BackoffConfig::new(Duration::from_millis(50), Duration::from_secs(1));
//! assert!(backoff.delay_for_attempt(0) >= Duration::from_millis(50));
//!
//! let checked = Validator::new().required("name", "nightly-job").into_result();
//! assert!(checked.is_ok());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod rate_limit;
pub mod retry;
pub mod validation;

pub use error::ErrorCode;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::ErrorCode;
    pub use crate::rate_limit::RateLimitState;
    pub use crate::retry::{
        is_retryable_status, retry_after, BackoffConfig, DEFAULT_RETRY_COUNT,
        DEFAULT_RETRY_WAIT_MAX, DEFAULT_RETRY_WAIT_MIN,
    };
    pub use crate::validation::{ValidationError, ValidationFailure, ValidationResult, Validator};
}
