//! Domain models and request/response payloads.
//!
//! Domain types (`User`, `Product`, ...) are validated objects built from
//! database rows. Request types are deserialized from JSON bodies and carry
//! their own `validate()` checks for constraints serde cannot express.

pub mod address;
pub mod market;
pub mod order;
pub mod otp;
pub mod product;
pub mod query;
pub mod rating;
pub mod user;

use serde::Serialize;
use thiserror::Error;

/// A request payload failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    /// Create a validation error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Check that a required text field is non-blank and at most `max` characters.
pub(crate) fn require_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(format!("{field} cannot be empty")));
    }
    limit_text(field, value, max)
}

/// Check that a text field is at most `max` characters.
pub(crate) fn limit_text(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::new(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

/// `{"message": "..."}` response body.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// `{"data": ...}` response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<T> {
    pub data: T,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(require_text("name", "Fresh Bread", 300).is_ok());
        assert_eq!(
            require_text("name", "   ", 300),
            Err(ValidationError::new("name cannot be empty"))
        );
        assert_eq!(
            require_text("name", &"x".repeat(301), 300),
            Err(ValidationError::new("name must be at most 300 characters"))
        );
    }

    #[test]
    fn test_limit_text_counts_chars_not_bytes() {
        assert!(limit_text("street", &"ü".repeat(111), 111).is_ok());
        assert!(limit_text("street", &"ü".repeat(112), 111).is_err());
    }
}
