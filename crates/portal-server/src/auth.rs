//! Caller identity and role checks
//!
//! Token validation happens upstream; the gateway forwards the authenticated
//! username in the `x-user-id` header. Handlers take a [`CurrentUser`] and
//! call [`CurrentUser::require`] once before doing any work.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use portal_common::Role;

use crate::api::response::AppError;
use crate::features::FeatureState;

pub const USER_HEADER: &str = "x-user-id";

/// The authenticated caller, loaded from the record store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub role: Role,
    pub email: String,
}

impl CurrentUser {
    /// Reject callers whose role is not `role`
    pub fn require(&self, role: Role) -> Result<(), AppError> {
        if self.role == role {
            Ok(())
        } else {
            tracing::warn!(
                username = %self.username,
                role = %self.role,
                required = %role,
                "Role check failed"
            );
            Err(AppError::Forbidden(format!(
                "This action requires the {} role",
                role
            )))
        }
    }
}

#[async_trait]
impl FromRequestParts<FeatureState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &FeatureState,
    ) -> Result<Self, Self::Rejection> {
        let username = parts
            .headers
            .get(USER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

        let account = state
            .store
            .get_account(username)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Unknown user".to_string()))?;

        Ok(CurrentUser {
            username: account.username,
            role: account.user_type,
            email: account.email,
        })
    }
}
