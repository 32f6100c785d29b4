//! Request field validation
//!
//! Request types check their own fields before anything is sent. The fluent
//! [`Validator`] collects every problem in one pass so the caller sees the
//! complete list instead of fixing fields one at a time.
//!
//! # Example
//!
//! ```rust
//! use opsgenie_core::validation::Validator;
//!
//! let result = Validator::new()
//!     .required("name", "")
//!     .check("interval", 10 > 0, "Must be positive")
//!     .into_result();
//!
//! let failure = result.unwrap_err();
//! assert_eq!(failure.errors().len(), 1);
//! assert_eq!(failure.to_string(), "name: Field is required");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single field-level validation problem
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Field that failed validation (empty for request-level problems)
    pub field: String,
    /// Error message
    pub message: String,
    /// Error code
    pub code: String,
    /// Expected value (if applicable)
    pub expected: Option<String>,
    /// Actual value (if applicable)
    pub actual: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.field.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

/// Validation result
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    errors: Vec<ValidationError>,
}

impl ValidationResult {
    /// Create a new empty result
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get all errors
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Add an error
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Merge another result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
    }

    /// Convert to a `Result`, failing if any error was recorded
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationFailure {
                errors: self.errors,
            })
        }
    }
}

/// A request that did not pass validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationFailure {
    errors: Vec<ValidationError>,
}

impl ValidationFailure {
    /// A request-level failure with a free-form message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            errors: vec![ValidationError {
                field: String::new(),
                message: message.into(),
                code: "INVALID_REQUEST".to_string(),
                expected: None,
                actual: None,
            }],
        }
    }

    /// Every recorded problem
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Fluent validator builder
pub struct Validator {
    result: ValidationResult,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    /// Create a new validator
    pub fn new() -> Self {
        Self {
            result: ValidationResult::new(),
        }
    }

    /// Validate that a field is not empty
    pub fn required(mut self, field: &str, value: &str) -> Self {
        if value.trim().is_empty() {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: "Field is required".to_string(),
                code: "REQUIRED".to_string(),
                expected: Some("non-empty value".to_string()),
                actual: Some("empty".to_string()),
            });
        }
        self
    }

    /// Record a failure when `condition` does not hold
    pub fn check(mut self, field: &str, condition: bool, message: &str) -> Self {
        if !condition {
            self.result.add_error(ValidationError {
                field: field.to_string(),
                message: message.to_string(),
                code: "CHECK".to_string(),
                expected: None,
                actual: None,
            });
        }
        self
    }

    /// Finish and return the collected result
    pub fn validate(self) -> ValidationResult {
        self.result
    }

    /// Finish and convert straight to a `Result`
    pub fn into_result(self) -> Result<(), ValidationFailure> {
        self.result.into_result()
    }
}
