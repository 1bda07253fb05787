//! Dedup-and-batch-write engine shared by every ingestion plan

use std::collections::BTreeSet;

use tracing::{error, info, instrument, warn};

use super::{csv, IngestContext, IngestError, IngestPlan, IngestReport, Upload};
use crate::db::StoreError;
use crate::storage::upload_key;

const CSV_CONTENT_TYPE: &str = "text/csv";

/// Run one ingestion from raw upload to notifications
#[instrument(skip_all, fields(plan = plan.name(), filename = %upload.filename, bytes = upload.data.len()))]
pub async fn run<P: IngestPlan>(
    ctx: &IngestContext,
    plan: &P,
    upload: Upload,
) -> Result<IngestReport, IngestError> {
    csv::check_extension(&upload.filename)?;

    let key = upload_key(plan.archive_category(), &upload.filename);
    let archived = ctx
        .blobs
        .put(&key, upload.data.clone(), Some(CSV_CONTENT_TYPE))
        .await?;
    info!(key = %archived.key, checksum = %archived.checksum, "Upload archived");

    // Every row is validated before the store is touched
    let drafts = csv::open(&upload.data, plan.required_fields())?
        .map(|row| row.map_err(IngestError::from).and_then(|row| plan.parse_row(&row)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut report = IngestReport::default();
    let mut seen = BTreeSet::new();
    let mut survivors = Vec::new();

    for draft in drafts {
        let key = plan.draft_key(&draft);
        if !seen.insert(key.clone()) {
            warn!(key = %key, "Skipping key repeated within the upload");
            report.skipped.push(key.to_string());
            continue;
        }
        if plan.exists(ctx.store.as_ref(), &key).await? {
            warn!(key = %key, "Skipping existing record");
            report.skipped.push(key.to_string());
            continue;
        }
        survivors.push((key, draft));
    }

    let mut keys = Vec::with_capacity(survivors.len());
    let mut records = Vec::with_capacity(survivors.len());
    let mut pending = Vec::with_capacity(survivors.len());
    for (key, draft) in survivors {
        let (record, extra) = plan.materialize(draft).await?;
        keys.push(key);
        records.push(record);
        pending.push(Some(extra));
    }

    let batch = match plan.write_batch(ctx.store.as_ref(), &records).await {
        Ok(batch) => batch,
        Err(StoreError::PartialBatch {
            written,
            attempted,
            source,
        }) => {
            let persisted: Vec<String> = written
                .iter()
                .filter_map(|&i| keys.get(i))
                .map(ToString::to_string)
                .collect();
            error!(
                written = ?persisted,
                attempted,
                error = %source,
                "Batch write failed partway; written records are kept and not notified"
            );
            return Err(StoreError::PartialBatch {
                written,
                attempted,
                source,
            }
            .into());
        },
        Err(e) => return Err(e.into()),
    };

    let mut written_pending = Vec::with_capacity(batch.count());
    let written: BTreeSet<usize> = batch.written.iter().copied().collect();
    for (index, key) in keys.iter().enumerate() {
        if written.contains(&index) {
            if let Some(extra) = pending[index].take() {
                written_pending.push(extra);
            }
        } else {
            warn!(key = %key, "Record claimed concurrently; not written");
            report.skipped.push(key.to_string());
        }
    }

    report.written_count = batch.count();
    info!(
        written = report.written_count,
        skipped = report.skipped.len(),
        "Batch written"
    );

    let outcome = plan.notify(ctx, written_pending).await;
    report.notified = outcome.sent;
    report.notification_failures = outcome.failed;
    report.unaddressed = outcome.unaddressed;

    Ok(report)
}
