pub mod change;
pub mod confirm_reset;
pub mod request_reset;

pub use change::ChangePasswordCommand;
pub use confirm_reset::ConfirmResetCommand;
pub use request_reset::RequestResetCommand;

use crate::api::response::AppError;
use crate::credentials::CredentialError;
use crate::db::StoreError;
use crate::features::shared::validation::FieldValidationError;

/// Failures shared by the password commands
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),

    #[error("User '{0}' not found")]
    UserNotFound(String),

    #[error("Current password is incorrect")]
    WrongPassword,

    #[error("Reset token is invalid or has already been used")]
    InvalidToken,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::Validation(e) => e.into(),
            e @ PasswordError::UserNotFound(_) => AppError::NotFound(e.to_string()),
            e @ PasswordError::WrongPassword => AppError::ValidationError(e.to_string()),
            e @ PasswordError::InvalidToken => AppError::InvalidToken(e.to_string()),
            PasswordError::Store(e) => e.into(),
            PasswordError::Credentials(e) => e.into(),
        }
    }
}
