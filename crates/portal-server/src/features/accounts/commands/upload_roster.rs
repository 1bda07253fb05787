//! Bulk account provisioning from a roster CSV

use portal_common::Role;

use crate::features::FeatureState;
use crate::ingest::{self, IngestError, IngestReport, Upload};

/// Create one account per new `username` in the uploaded roster
#[derive(Debug, Clone)]
pub struct UploadRosterCommand {
    pub role: Role,
    pub upload: Upload,
}

#[tracing::instrument(
    skip(state, command),
    fields(role = %command.role, filename = %command.upload.filename)
)]
pub async fn handle(
    state: &FeatureState,
    command: UploadRosterCommand,
) -> Result<IngestReport, IngestError> {
    let report = ingest::ingest_accounts(&state.ingest_context(), command.upload, command.role).await?;

    tracing::info!(
        written = report.written_count,
        skipped = report.skipped.len(),
        notified = report.notified,
        "Roster ingested"
    );

    Ok(report)
}
