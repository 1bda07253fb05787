//! Result Portal Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared types, utilities, and error handling for the result portal workspace.
//!
//! - **Error Handling**: [`PortalError`] and the crate [`Result`] alias
//! - **Logging**: tracing subscriber configuration shared by all binaries
//! - **Types**: account roles and the [`types::Secret`] wrapper for credentials
//! - **Checksums**: SHA-256 digests for archived uploads

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{PortalError, Result};
pub use types::{Role, Secret};
