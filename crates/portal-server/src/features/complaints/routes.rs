//! Complaint API routes
//!
//! - `POST /api/v1/complaints` - file a complaint as the caller
//! - `GET /api/v1/complaints` - list all complaints (STAFF)
//! - `POST /api/v1/complaints/:id/resolve` - mark resolved (STAFF)

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_common::Role;

use super::commands::{ResolveComplaintCommand, SubmitComplaintCommand};
use crate::api::response::{ApiResponse, AppError};
use crate::auth::CurrentUser;
use crate::features::FeatureState;

pub fn complaint_routes() -> Router<FeatureState> {
    Router::new()
        .route("/complaints", get(list).post(submit))
        .route("/complaints/:id/resolve", post(resolve))
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn submit(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Json(command): Json<SubmitComplaintCommand>,
) -> Result<Response, AppError> {
    let complaint = super::commands::submit::handle(&state, &user.username, command).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(complaint))).into_response())
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn list(State(state): State<FeatureState>, user: CurrentUser) -> Result<Response, AppError> {
    user.require(Role::Staff)?;
    let response = super::queries::list::handle(&state).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip_all, fields(caller = %user.username, complaint_id = %id))]
async fn resolve(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    user.require(Role::Staff)?;
    let complaint =
        super::commands::resolve::handle(&state, ResolveComplaintCommand { id }).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(complaint))).into_response())
}
