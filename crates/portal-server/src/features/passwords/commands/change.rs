use portal_common::Secret;
use serde::Deserialize;

use super::PasswordError;
use crate::credentials;
use crate::features::shared::validation::validate_required;
use crate::features::FeatureState;

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordCommand {
    pub current_password: Secret,
    pub new_password: Secret,
}

#[tracing::instrument(skip(state, command), fields(username = %username))]
pub async fn handle(
    state: &FeatureState,
    username: &str,
    command: ChangePasswordCommand,
) -> Result<(), PasswordError> {
    validate_required(command.new_password.expose(), "new_password")?;

    let account = state
        .store
        .get_account(username)
        .await?
        .ok_or_else(|| PasswordError::UserNotFound(username.to_string()))?;

    let valid =
        credentials::verify_password_blocking(command.current_password, account.password.clone())
            .await?;
    if !valid {
        tracing::warn!("Password change rejected");
        return Err(PasswordError::WrongPassword);
    }

    let password_hash = credentials::hash_password_blocking(command.new_password).await?;
    if !state.store.set_password(username, &password_hash).await? {
        return Err(PasswordError::UserNotFound(username.to_string()));
    }

    tracing::info!("Password changed");
    Ok(())
}
