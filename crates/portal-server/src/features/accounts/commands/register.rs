//! Self-registration of student accounts

use portal_common::{Role, Secret};
use serde::Deserialize;

use crate::api::response::AppError;
use crate::credentials::{self, CredentialError};
use crate::db::StoreError;
use crate::features::shared::validation::{
    validate_email, validate_max_chars, validate_required, FieldValidationError,
};
use crate::features::FeatureState;
use crate::models::{Account, AccountProfile, EMAIL_MAX, USERNAME_MAX};
use crate::notify::send_quietly;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCommand {
    pub username: String,
    pub email: String,
    pub password: Secret,
    /// Defaults to STUDENT; no other role can self-register
    #[serde(default)]
    pub user_type: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum RegisterError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),

    #[error("Self-registration is only available for student accounts (got '{0}')")]
    RoleNotAllowed(String),

    #[error("Username '{0}' already exists")]
    UsernameTaken(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl From<RegisterError> for AppError {
    fn from(err: RegisterError) -> Self {
        match err {
            RegisterError::Validation(e) => e.into(),
            e @ RegisterError::RoleNotAllowed(_) => AppError::ValidationError(e.to_string()),
            e @ RegisterError::UsernameTaken(_) => AppError::Conflict(e.to_string()),
            RegisterError::Store(e) => e.into(),
            RegisterError::Credentials(e) => e.into(),
        }
    }
}

impl RegisterCommand {
    pub fn validate(&self) -> Result<Role, RegisterError> {
        validate_required(&self.username, "username")?;
        validate_max_chars(self.username.trim(), "username", USERNAME_MAX)?;
        validate_email(&self.email, "email")?;
        validate_max_chars(self.email.trim(), "email", EMAIL_MAX)?;
        validate_required(self.password.expose(), "password")?;

        match self.user_type.as_deref().map(str::trim) {
            None | Some("") => Ok(Role::Student),
            Some(raw) => match raw.parse::<Role>() {
                Ok(Role::Student) => Ok(Role::Student),
                _ => Err(RegisterError::RoleNotAllowed(raw.to_string())),
            },
        }
    }
}

#[tracing::instrument(skip(state, command), fields(username = %command.username))]
pub async fn handle(
    state: &FeatureState,
    command: RegisterCommand,
) -> Result<AccountProfile, RegisterError> {
    let role = command.validate()?;
    let username = command.username.trim().to_string();
    let email = command.email.trim().to_string();

    if state.store.get_account(&username).await?.is_some() {
        return Err(RegisterError::UsernameTaken(username));
    }

    let hash = credentials::hash_password_blocking(command.password).await?;
    let account = Account::new(&username, hash, role, &email);

    let batch = state.store.put_accounts(std::slice::from_ref(&account)).await?;
    if batch.count() == 0 {
        return Err(RegisterError::UsernameTaken(username));
    }

    tracing::info!("Account registered");

    if let Err(e) = state.notifier.subscribe(&email).await {
        tracing::warn!(error = %e, "Subscription failed");
    }
    send_quietly(state.notifier.as_ref(), &state.messages.registered(&email)).await;

    Ok(account.profile())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(user_type: Option<&str>) -> RegisterCommand {
        RegisterCommand {
            username: "carol".to_string(),
            email: "c@x.com".to_string(),
            password: Secret::new("pw"),
            user_type: user_type.map(str::to_string),
        }
    }

    #[test]
    fn test_defaults_to_student() {
        assert_eq!(command(None).validate().unwrap(), Role::Student);
        assert_eq!(command(Some("student")).validate().unwrap(), Role::Student);
    }

    #[test]
    fn test_rejects_privileged_roles() {
        assert!(matches!(
            command(Some("ADMIN")).validate(),
            Err(RegisterError::RoleNotAllowed(_))
        ));
        assert!(matches!(
            command(Some("janitor")).validate(),
            Err(RegisterError::RoleNotAllowed(_))
        ));
    }

    #[test]
    fn test_rejects_overlong_username_and_email() {
        let mut cmd = command(None);
        cmd.username = "u".repeat(USERNAME_MAX);
        assert!(cmd.validate().is_ok());
        cmd.username.push('u');
        assert!(matches!(
            cmd.validate(),
            Err(RegisterError::Validation(FieldValidationError::TooLong { field: "username", .. }))
        ));

        let mut cmd = command(None);
        cmd.email = format!("{}@x.com", "e".repeat(EMAIL_MAX));
        assert!(matches!(
            cmd.validate(),
            Err(RegisterError::Validation(FieldValidationError::TooLong { field: "email", .. }))
        ));
    }

    #[test]
    fn test_requires_password() {
        let mut cmd = command(None);
        cmd.password = Secret::new("");
        assert!(matches!(cmd.validate(), Err(RegisterError::Validation(_))));
    }
}
