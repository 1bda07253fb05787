use portal_common::Secret;
use serde::Deserialize;

use super::PasswordError;
use crate::credentials;
use crate::features::shared::validation::validate_required;
use crate::features::FeatureState;

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmResetCommand {
    pub token: Secret,
    pub new_password: Secret,
}

/// Set a new password for the holder of `token` and consume the token
#[tracing::instrument(skip_all)]
pub async fn handle(state: &FeatureState, command: ConfirmResetCommand) -> Result<(), PasswordError> {
    validate_required(command.new_password.expose(), "new_password")?;
    if command.token.expose().trim().is_empty() {
        return Err(PasswordError::InvalidToken);
    }

    if state
        .store
        .find_account_by_reset_token(command.token.expose())
        .await?
        .is_none()
    {
        return Err(PasswordError::InvalidToken);
    }

    let password_hash = credentials::hash_password_blocking(command.new_password).await?;
    let username = state
        .store
        .consume_reset_token(command.token.expose(), &password_hash)
        .await?
        .ok_or(PasswordError::InvalidToken)?;

    tracing::info!(username = %username, "Password reset completed");
    Ok(())
}
