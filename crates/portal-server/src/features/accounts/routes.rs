//! Account API routes
//!
//! - `POST /api/v1/admin/upload-staff` - provision STAFF accounts from CSV (ADMIN)
//! - `POST /api/v1/admin/upload-students` - provision STUDENT accounts from CSV (ADMIN)
//! - `POST /api/v1/register` - self-register a student account
//! - `POST /api/v1/auth/verify` - check a username/password pair

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use portal_common::Role;

use super::commands::{RegisterCommand, UploadRosterCommand};
use super::queries::VerifyCredentialsQuery;
use crate::api::response::{ApiResponse, AppError};
use crate::auth::CurrentUser;
use crate::features::{shared::read_upload, FeatureState};

pub fn admin_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload-staff", post(upload_staff))
        .route("/upload-students", post(upload_students))
}

pub fn account_routes() -> Router<FeatureState> {
    Router::new()
        .route("/register", post(register))
        .route("/auth/verify", post(verify_credentials))
}

async fn upload_roster(
    state: FeatureState,
    user: CurrentUser,
    multipart: Multipart,
    role: Role,
) -> Result<Response, AppError> {
    user.require(Role::Admin)?;
    let upload = read_upload(multipart).await?;

    let report = super::commands::upload_roster::handle(&state, UploadRosterCommand { role, upload }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(report))).into_response())
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn upload_staff(
    State(state): State<FeatureState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    upload_roster(state, user, multipart, Role::Staff).await
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn upload_students(
    State(state): State<FeatureState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    upload_roster(state, user, multipart, Role::Student).await
}

#[tracing::instrument(skip_all, fields(username = %command.username))]
async fn register(
    State(state): State<FeatureState>,
    Json(command): Json<RegisterCommand>,
) -> Result<Response, AppError> {
    let profile = super::commands::register::handle(&state, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(profile))).into_response())
}

#[tracing::instrument(skip_all, fields(username = %query.username))]
async fn verify_credentials(
    State(state): State<FeatureState>,
    Json(query): Json<VerifyCredentialsQuery>,
) -> Result<Response, AppError> {
    let profile = super::queries::verify_credentials::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(profile))).into_response())
}
