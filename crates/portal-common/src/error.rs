//! Error types shared across the portal crates

use thiserror::Error;

/// Result type alias for shared operations
pub type Result<T> = std::result::Result<T, PortalError>;

/// Errors raised by shared helpers
#[derive(Error, Debug)]
pub enum PortalError {
    #[error("Unknown role: {0}")]
    UnknownRole(String),
}
