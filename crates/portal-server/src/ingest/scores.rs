//! Score ingestion: one result per `student_id,subject,score,grade` row
//!
//! Scores must be integers within [`SCORE_MIN`, `SCORE_MAX`]; a single bad
//! value aborts the upload before anything is written. Students are notified
//! once per upload, at the email on their account or, failing that, at the
//! row's optional `email` column.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::warn;

use super::{IngestContext, IngestError, IngestPlan, NotifyOutcome, Row};
use crate::db::{BatchWrite, RecordStore, StoreError};
use crate::models::{
    Score, ScoreKey, GRADE_MAX, RESULT_SUBJECT_MAX, SCORE_MAX, SCORE_MIN, USERNAME_MAX,
};
use crate::notify::fan_out;

const REQUIRED_FIELDS: &[&str] = &["student_id", "subject", "score", "grade"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreDraft {
    pub student_id: String,
    pub subject: String,
    pub score: i32,
    pub grade: String,
    pub email: Option<String>,
}

/// Student to tell about new results
pub struct ResultsFor {
    student_id: String,
    row_email: Option<String>,
}

pub struct ScorePlan {
    uploaded_by: String,
    uploaded_at: DateTime<Utc>,
}

impl ScorePlan {
    pub fn new(uploaded_by: impl Into<String>) -> Self {
        Self {
            uploaded_by: uploaded_by.into(),
            uploaded_at: Utc::now(),
        }
    }
}

/// Parse a score cell; `None` unless it is an integer within range
pub fn parse_score(raw: &str) -> Option<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|score| (SCORE_MIN..=SCORE_MAX).contains(score))
}

#[async_trait]
impl IngestPlan for ScorePlan {
    type Draft = ScoreDraft;
    type Key = ScoreKey;
    type Record = Score;
    type Pending = ResultsFor;

    fn name(&self) -> &'static str {
        "scores"
    }

    fn archive_category(&self) -> &'static str {
        "results"
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn parse_row(&self, row: &Row) -> Result<ScoreDraft, IngestError> {
        let student_id = row
            .non_blank("student_id")
            .ok_or_else(|| IngestError::validation(row, "student_id is required"))?;
        let subject = row
            .non_blank("subject")
            .ok_or_else(|| IngestError::validation(row, "subject is required"))?;
        let raw_score = row.get("score").unwrap_or_default();
        let score = parse_score(raw_score).ok_or_else(|| {
            IngestError::validation(
                row,
                format!(
                    "score '{}' for {}/{} must be an integer between {} and {}",
                    raw_score.trim(),
                    student_id,
                    subject,
                    SCORE_MIN,
                    SCORE_MAX
                ),
            )
        })?;
        let grade = row
            .non_blank("grade")
            .ok_or_else(|| IngestError::validation(row, "grade is required"))?;
        IngestError::check_length(row, "student_id", student_id, USERNAME_MAX)?;
        IngestError::check_length(row, "subject", subject, RESULT_SUBJECT_MAX)?;
        IngestError::check_length(row, "grade", grade, GRADE_MAX)?;

        Ok(ScoreDraft {
            student_id: student_id.to_string(),
            subject: subject.to_string(),
            score,
            grade: grade.to_string(),
            email: row.non_blank("email").map(str::to_string),
        })
    }

    fn draft_key(&self, draft: &ScoreDraft) -> ScoreKey {
        ScoreKey::new(&draft.student_id, &draft.subject)
    }

    async fn exists(&self, store: &dyn RecordStore, key: &ScoreKey) -> Result<bool, StoreError> {
        Ok(store.get_score(key).await?.is_some())
    }

    async fn materialize(&self, draft: ScoreDraft) -> Result<(Score, ResultsFor), IngestError> {
        let pending = ResultsFor {
            student_id: draft.student_id.clone(),
            row_email: draft.email,
        };
        let score = Score {
            student_id: draft.student_id,
            subject: draft.subject,
            score: draft.score,
            grade: draft.grade,
            uploaded_by: self.uploaded_by.clone(),
            uploaded_at: self.uploaded_at,
        };
        Ok((score, pending))
    }

    async fn write_batch(
        &self,
        store: &dyn RecordStore,
        records: &[Score],
    ) -> Result<BatchWrite, StoreError> {
        store.put_scores(records).await
    }

    async fn notify(&self, ctx: &IngestContext, pending: Vec<ResultsFor>) -> NotifyOutcome {
        // One message per student, whatever the number of subjects
        let mut students: BTreeMap<String, Option<String>> = BTreeMap::new();
        for item in pending {
            let fallback = students.entry(item.student_id).or_default();
            if fallback.is_none() {
                *fallback = item.row_email;
            }
        }

        let addresses = join_all(students.into_iter().map(|(student_id, row_email)| async move {
            let account_email = match ctx.store.get_account(&student_id).await {
                Ok(account) => account.map(|a| a.email),
                Err(e) => {
                    warn!(student_id = %student_id, error = %e, "Account lookup failed");
                    None
                },
            };
            let address = account_email.or(row_email);
            if address.is_none() {
                warn!(student_id = %student_id, "No email known; results notification skipped");
            }
            address
        }))
        .await;

        let unaddressed = addresses.iter().filter(|a| a.is_none()).count();
        let notifications: Vec<_> = addresses
            .iter()
            .flatten()
            .map(|email| ctx.messages.results_ready(email))
            .collect();

        let report = fan_out(ctx.notifier.as_ref(), &notifications).await;
        NotifyOutcome {
            sent: report.sent,
            failed: report.failed,
            unaddressed,
        }
    }
}
