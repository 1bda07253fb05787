//! Complaint submission
//!
//! The author is always the authenticated caller; the request body carries
//! only the subject and content. Teachers are told through a single message
//! to the broadcast address, and a failed send never fails the submission.

use serde::Deserialize;

use crate::api::response::AppError;
use crate::db::StoreError;
use crate::features::shared::validation::{
    validate_max_chars, validate_required, FieldValidationError,
};
use crate::features::FeatureState;
use crate::models::{Complaint, COMPLAINT_CONTENT_MAX, COMPLAINT_SUBJECT_MAX};
use crate::notify::send_quietly;

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitComplaintCommand {
    pub subject: String,
    pub content: String,
}

#[derive(Debug, thiserror::Error)]
pub enum SubmitComplaintError {
    #[error(transparent)]
    Validation(#[from] FieldValidationError),

    #[error("Complaint id '{0}' already exists")]
    DuplicateId(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<SubmitComplaintError> for AppError {
    fn from(err: SubmitComplaintError) -> Self {
        match err {
            SubmitComplaintError::Validation(e) => e.into(),
            e @ SubmitComplaintError::DuplicateId(_) => AppError::InternalError(e.to_string()),
            SubmitComplaintError::Store(e) => e.into(),
        }
    }
}

impl SubmitComplaintCommand {
    pub fn validate(&self) -> Result<(), FieldValidationError> {
        validate_required(&self.subject, "subject")?;
        validate_max_chars(&self.subject, "subject", COMPLAINT_SUBJECT_MAX)?;
        validate_required(&self.content, "content")?;
        validate_max_chars(&self.content, "content", COMPLAINT_CONTENT_MAX)?;
        Ok(())
    }
}

#[tracing::instrument(skip(state, command), fields(author = %author))]
pub async fn handle(
    state: &FeatureState,
    author: &str,
    command: SubmitComplaintCommand,
) -> Result<Complaint, SubmitComplaintError> {
    command.validate()?;

    let complaint = Complaint::new(author, command.subject, command.content);
    if !state.store.put_complaint(&complaint).await? {
        return Err(SubmitComplaintError::DuplicateId(complaint.id));
    }

    tracing::info!(complaint_id = %complaint.id, "Complaint submitted");

    let notification = state
        .messages
        .complaint_filed(&state.teachers_address, &complaint);
    send_quietly(state.notifier.as_ref(), &notification).await;

    Ok(complaint)
}
