//! Credential check for the external token issuer

use portal_common::Secret;
use serde::Deserialize;

use crate::api::response::AppError;
use crate::credentials::{self, CredentialError};
use crate::db::{RecordStore, StoreError};
use crate::features::FeatureState;
use crate::models::{Account, AccountProfile};

#[derive(Debug, Clone, Deserialize)]
pub struct VerifyCredentialsQuery {
    pub username: String,
    pub password: Secret,
}

#[derive(Debug, thiserror::Error)]
pub enum VerifyCredentialsError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),
}

impl From<VerifyCredentialsError> for AppError {
    fn from(err: VerifyCredentialsError) -> Self {
        match err {
            e @ VerifyCredentialsError::InvalidCredentials => AppError::Unauthorized(e.to_string()),
            VerifyCredentialsError::Store(e) => e.into(),
            VerifyCredentialsError::Credentials(e) => e.into(),
        }
    }
}

/// The account if `password` matches its stored hash
pub async fn authenticate(
    store: &dyn RecordStore,
    username: &str,
    password: Secret,
) -> Result<Option<Account>, VerifyCredentialsError> {
    let Some(account) = store.get_account(username.trim()).await? else {
        return Ok(None);
    };

    let valid = credentials::verify_password_blocking(password, account.password.clone()).await?;
    Ok(valid.then_some(account))
}

/// Profile of the account if `password` matches, otherwise `InvalidCredentials`
#[tracing::instrument(skip(state, query), fields(username = %query.username))]
pub async fn handle(
    state: &FeatureState,
    query: VerifyCredentialsQuery,
) -> Result<AccountProfile, VerifyCredentialsError> {
    match authenticate(state.store.as_ref(), &query.username, query.password).await? {
        Some(account) => Ok(account.profile()),
        None => {
            tracing::warn!("Credential check failed");
            Err(VerifyCredentialsError::InvalidCredentials)
        },
    }
}
