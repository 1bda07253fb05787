//! Shared utilities for feature modules
//!
//! - **validation**: field validation helpers
//! - **upload**: multipart CSV extraction

pub mod upload;
pub mod validation;

pub use upload::read_upload;
pub use validation::{validate_email, validate_max_chars, validate_required, FieldValidationError};
