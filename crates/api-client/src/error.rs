//! Error types for the API client

use crate::context::ContextError;
use opsgenie_core::retry::is_retryable_status;
use opsgenie_core::validation::ValidationFailure;
use opsgenie_core::ErrorCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error for any response with status 300 or above
///
/// The body fields are decoded best-effort: a body that is not JSON leaves
/// them empty, and the status code and error-type header are always filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    /// Decimal HTTP status
    #[serde(skip)]
    pub status_code: String,
    /// Server message
    pub message: String,
    /// Server-side processing time in seconds
    pub took: f32,
    /// Server request ID
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// Per-field problems
    pub errors: Option<BTreeMap<String, String>>,
    /// Value of the `X-Opsgenie-Errortype` header
    #[serde(skip)]
    pub error_header: String,
}

impl ApiError {
    /// Decode an error body, keeping whatever fields are readable
    pub fn from_body(body: &[u8]) -> Self {
        if let Ok(decoded) = serde_json::from_slice::<Self>(body) {
            return decoded;
        }

        // Mistyped fields should not hide the readable ones
        let Ok(serde_json::Value::Object(fields)) = serde_json::from_slice(body) else {
            return Self::default();
        };
        let text = |key: &str| {
            fields
                .get(key)
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        #[allow(clippy::cast_possible_truncation)]
        let took = fields
            .get("took")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or_default() as f32;
        let errors = fields.get("errors").and_then(|value| {
            value.as_object().map(|map| {
                map.iter()
                    .map(|(k, v)| {
                        let v = v.as_str().map_or_else(|| v.to_string(), str::to_string);
                        (k.clone(), v)
                    })
                    .collect()
            })
        });

        Self {
            message: text("message"),
            took,
            request_id: text("requestId"),
            errors,
            ..Self::default()
        }
    }

    /// HTTP status as a number
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        self.status_code.parse().ok()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Error occurred with Status code: {}, Message: {}, Took: {:.6}, RequestId: {}",
            self.status_code, self.message, self.took, self.request_id
        )?;
        if !self.error_header.is_empty() {
            write!(f, ", Error Header: {}", self.error_header)?;
        }
        if let Some(errors) = &self.errors {
            let detail = errors
                .iter()
                .map(|(field, message)| format!("{field}:{message}"))
                .collect::<Vec<_>>()
                .join(" ");
            write!(f, ", Error Detail: map[{detail}]")?;
        }
        Ok(())
    }
}

impl std::error::Error for ApiError {}

/// Client errors
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid client configuration
    #[error("{0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Request rejected by its own validation; nothing was sent
    #[error("{0}")]
    Validation(#[from] ValidationFailure),

    /// Request could not be turned into an HTTP request
    #[error("Request could not be built: {0}")]
    Build(String),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Network failure after retries, or a failure that is never retried
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The call's context was cancelled or expired
    #[error("{0}")]
    Context(#[from] ContextError),

    /// The service answered with status 300 or above
    #[error("{0}")]
    Api(#[from] ApiError),

    /// A success body did not decode into the response type
    #[error("Response could not be parsed, {0}")]
    Parse(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a request-level validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(ValidationFailure::new(msg))
    }

    /// Create a build error
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }

    /// Stable classification code
    #[must_use]
    pub fn kind(&self) -> ErrorCode {
        match self {
            Self::Config(_) => ErrorCode::ConfigError,
            Self::MissingEnvVar(_) => ErrorCode::MissingEnvVar,
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::Build(_) => ErrorCode::BuildError,
            Self::Json(_) => ErrorCode::SerializationError,
            Self::Transport(_) => ErrorCode::TransportError,
            Self::Context(ContextError::Canceled) => ErrorCode::Canceled,
            Self::Context(ContextError::DeadlineExceeded) => ErrorCode::DeadlineExceeded,
            Self::Api(_) => ErrorCode::ApiResponse,
            Self::Parse(_) => ErrorCode::ParseError,
        }
    }

    /// The structured service error, if this is one
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }

    /// Check if another call might succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout(),
            Self::Api(e) => e.status().is_some_and(is_retryable_status),
            Self::Config(_)
            | Self::MissingEnvVar(_)
            | Self::Validation(_)
            | Self::Build(_)
            | Self::Json(_)
            | Self::Context(_)
            | Self::Parse(_) => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self.api_error().and_then(ApiError::status), Some(status) if (400..500).contains(&status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self.api_error().and_then(ApiError::status), Some(status) if status >= 500)
    }
}
