//! Password reset and change
//!
//! Commands only; there is nothing to query.

pub mod commands;
pub mod routes;

pub use commands::{ChangePasswordCommand, ConfirmResetCommand, PasswordError, RequestResetCommand};

pub use routes::password_routes;
