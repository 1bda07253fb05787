//! Password routes
//!
//! - `POST /api/v1/password-reset` - mail a reset link
//! - `POST /api/v1/password-reset/confirm` - redeem a reset token
//! - `POST /api/v1/change-password` - change the caller's password

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use super::commands::{ChangePasswordCommand, ConfirmResetCommand, RequestResetCommand};
use crate::api::response::{ApiResponse, AppError, MessageBody};
use crate::auth::CurrentUser;
use crate::features::FeatureState;

pub fn password_routes() -> Router<FeatureState> {
    Router::new()
        .route("/password-reset", post(request_reset))
        .route("/password-reset/confirm", post(confirm_reset))
        .route("/change-password", post(change_password))
}

fn ok(message: &str) -> Response {
    (StatusCode::OK, Json(ApiResponse::success(MessageBody::new(message)))).into_response()
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
async fn request_reset(
    State(state): State<FeatureState>,
    Json(command): Json<RequestResetCommand>,
) -> Result<Response, AppError> {
    super::commands::request_reset::handle(&state, command).await?;
    Ok(ok("Password reset link sent"))
}

#[tracing::instrument(skip_all)]
async fn confirm_reset(
    State(state): State<FeatureState>,
    Json(command): Json<ConfirmResetCommand>,
) -> Result<Response, AppError> {
    super::commands::confirm_reset::handle(&state, command).await?;
    Ok(ok("Password has been reset"))
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn change_password(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Json(command): Json<ChangePasswordCommand>,
) -> Result<Response, AppError> {
    super::commands::change::handle(&state, &user.username, command).await?;
    Ok(ok("Password changed"))
}
