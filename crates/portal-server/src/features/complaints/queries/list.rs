use serde::Serialize;

use crate::db::StoreError;
use crate::features::FeatureState;
use crate::models::Complaint;

#[derive(Debug, Clone, Serialize)]
pub struct ListComplaintsResponse {
    pub complaints: Vec<Complaint>,
    pub total: usize,
    pub open: usize,
}

#[tracing::instrument(skip(state))]
pub async fn handle(state: &FeatureState) -> Result<ListComplaintsResponse, StoreError> {
    let complaints = state.store.list_complaints().await?;
    let open = complaints.iter().filter(|c| !c.resolved).count();
    Ok(ListComplaintsResponse {
        total: complaints.len(),
        open,
        complaints,
    })
}
