//! Score API routes
//!
//! - `POST /api/v1/teachers/upload-results` - ingest a results CSV (STAFF)
//! - `GET /api/v1/teachers/all-results?uploaded_by=` - list results (STAFF)
//! - `GET /api/v1/students/my-results` - the caller's own results

use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use portal_common::Role;
use serde::Deserialize;

use super::commands::UploadScoresCommand;
use super::queries::ListScoresQuery;
use crate::api::response::{ApiResponse, AppError};
use crate::auth::CurrentUser;
use crate::features::{shared::read_upload, FeatureState};

pub fn teacher_routes() -> Router<FeatureState> {
    Router::new()
        .route("/upload-results", post(upload_results))
        .route("/all-results", get(all_results))
}

pub fn student_routes() -> Router<FeatureState> {
    Router::new().route("/my-results", get(my_results))
}

#[derive(Debug, Deserialize)]
struct AllResultsParams {
    uploaded_by: Option<String>,
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn upload_results(
    State(state): State<FeatureState>,
    user: CurrentUser,
    multipart: Multipart,
) -> Result<Response, AppError> {
    user.require(Role::Staff)?;
    let upload = read_upload(multipart).await?;

    let command = UploadScoresCommand {
        uploaded_by: user.username,
        upload,
    };
    let report = super::commands::upload::handle(&state, command).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(report))).into_response())
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn all_results(
    State(state): State<FeatureState>,
    user: CurrentUser,
    Query(params): Query<AllResultsParams>,
) -> Result<Response, AppError> {
    user.require(Role::Staff)?;

    let query = ListScoresQuery {
        student_id: None,
        uploaded_by: params.uploaded_by,
    };
    let response = super::queries::list::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}

#[tracing::instrument(skip_all, fields(caller = %user.username))]
async fn my_results(
    State(state): State<FeatureState>,
    user: CurrentUser,
) -> Result<Response, AppError> {
    let query = ListScoresQuery {
        student_id: Some(user.username),
        uploaded_by: None,
    };
    let response = super::queries::list::handle(&state, query).await?;

    Ok((StatusCode::OK, Json(ApiResponse::success(response))).into_response())
}
