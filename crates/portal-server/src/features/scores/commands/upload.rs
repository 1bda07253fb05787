//! Result upload by a staff member

use crate::features::FeatureState;
use crate::ingest::{self, IngestError, IngestReport, Upload};

#[derive(Debug, Clone)]
pub struct UploadScoresCommand {
    /// Username recorded as `uploaded_by` on every score
    pub uploaded_by: String,
    pub upload: Upload,
}

#[tracing::instrument(
    skip(state, command),
    fields(uploaded_by = %command.uploaded_by, filename = %command.upload.filename)
)]
pub async fn handle(
    state: &FeatureState,
    command: UploadScoresCommand,
) -> Result<IngestReport, IngestError> {
    let report =
        ingest::ingest_scores(&state.ingest_context(), command.upload, &command.uploaded_by).await?;

    tracing::info!(
        written = report.written_count,
        skipped = report.skipped.len(),
        notified = report.notified,
        unaddressed = report.unaddressed,
        "Results ingested"
    );

    Ok(report)
}
