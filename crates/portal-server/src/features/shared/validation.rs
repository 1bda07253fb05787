//! Shared validation utilities
//!
//! Lengths are counted in characters, not bytes.
//!
//! ```rust,ignore
//! use portal_server::features::shared::validation::{validate_required, validate_max_chars};
//!
//! validate_required(&command.username, "username")?;
//! validate_max_chars(&command.subject, "subject", 100)?;
//! ```

use thiserror::Error;

use crate::api::response::AppError;

/// Errors that can occur during field validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldValidationError {
    #[error("{field} is required and cannot be empty")]
    Required { field: &'static str },

    #[error("{field} must be at most {max_length} characters (got {actual})")]
    TooLong {
        field: &'static str,
        max_length: usize,
        actual: usize,
    },

    #[error("{field} is not a valid email address")]
    InvalidEmail { field: &'static str },
}

impl From<FieldValidationError> for AppError {
    fn from(err: FieldValidationError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

/// Reject empty or whitespace-only values
pub fn validate_required(value: &str, field: &'static str) -> Result<(), FieldValidationError> {
    if value.trim().is_empty() {
        return Err(FieldValidationError::Required { field });
    }
    Ok(())
}

/// Reject values longer than `max_length` characters
pub fn validate_max_chars(
    value: &str,
    field: &'static str,
    max_length: usize,
) -> Result<(), FieldValidationError> {
    let actual = value.chars().count();
    if actual > max_length {
        return Err(FieldValidationError::TooLong {
            field,
            max_length,
            actual,
        });
    }
    Ok(())
}

/// Minimal shape check: one `@` with text on both sides
pub fn validate_email(value: &str, field: &'static str) -> Result<(), FieldValidationError> {
    validate_required(value, field)?;
    match value.trim().split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') => {
            Ok(())
        },
        _ => Err(FieldValidationError::InvalidEmail { field }),
    }
}
