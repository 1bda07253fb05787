use crate::api::response::AppError;
use crate::db::StoreError;
use crate::features::FeatureState;
use crate::models::Complaint;

#[derive(Debug, Clone)]
pub struct ResolveComplaintCommand {
    pub id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveComplaintError {
    #[error("Complaint '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ResolveComplaintError> for AppError {
    fn from(err: ResolveComplaintError) -> Self {
        match err {
            e @ ResolveComplaintError::NotFound(_) => AppError::NotFound(e.to_string()),
            ResolveComplaintError::Store(e) => e.into(),
        }
    }
}

/// Mark a complaint resolved; resolving twice rewrites the same state
#[tracing::instrument(skip(state), fields(complaint_id = %command.id))]
pub async fn handle(
    state: &FeatureState,
    command: ResolveComplaintCommand,
) -> Result<Complaint, ResolveComplaintError> {
    let mut complaint = state
        .store
        .get_complaint(&command.id)
        .await?
        .ok_or_else(|| ResolveComplaintError::NotFound(command.id.clone()))?;

    complaint.resolved = true;
    if !state.store.update_complaint(&complaint).await? {
        return Err(ResolveComplaintError::NotFound(command.id));
    }

    tracing::info!("Complaint resolved");
    Ok(complaint)
}
