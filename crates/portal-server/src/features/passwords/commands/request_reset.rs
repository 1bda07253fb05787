use serde::Deserialize;

use super::PasswordError;
use crate::credentials;
use crate::features::shared::validation::validate_required;
use crate::features::FeatureState;
use crate::notify::send_quietly;

#[derive(Debug, Clone, Deserialize)]
pub struct RequestResetCommand {
    pub username: String,
}

/// Issue a fresh reset token, replacing any earlier one, and mail the link.
///
/// The token is stored as issued so that it can be matched on confirm.
#[tracing::instrument(skip(state, command), fields(username = %command.username))]
pub async fn handle(state: &FeatureState, command: RequestResetCommand) -> Result<(), PasswordError> {
    validate_required(&command.username, "username")?;
    let username = command.username.trim();

    let account = state
        .store
        .get_account(username)
        .await?
        .ok_or_else(|| PasswordError::UserNotFound(username.to_string()))?;

    let token = credentials::reset_token();
    if !state.store.set_reset_token(username, token.expose()).await? {
        return Err(PasswordError::UserNotFound(username.to_string()));
    }

    tracing::info!("Password reset requested");

    let notification = state.messages.password_reset(&account.email, &token);
    send_quietly(state.notifier.as_ref(), &notification).await;

    Ok(())
}
