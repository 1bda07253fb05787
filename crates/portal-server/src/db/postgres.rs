//! PostgreSQL record store
//!
//! Inserts use `ON CONFLICT DO NOTHING`, so a concurrent writer that claims a
//! key between the existence check and the batch write wins and the later
//! record is reported as not written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use portal_common::Role;
use sqlx::PgPool;
use tracing::{debug, instrument};

use super::{BatchWrite, RecordStore, StoreError, StoreResult};
use crate::models::{Account, Complaint, Score, ScoreFilter, ScoreKey};

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    username: String,
    password: String,
    user_type: String,
    email: String,
    reset_token: Option<String>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let user_type = row
            .user_type
            .parse::<Role>()
            .map_err(|e| StoreError::corrupt(&row.username, e.to_string()))?;

        Ok(Account {
            username: row.username,
            password: row.password,
            user_type,
            email: row.email,
            reset_token: row.reset_token,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ScoreRow {
    student_id: String,
    subject: String,
    score: i32,
    grade: String,
    uploaded_by: String,
    uploaded_at: DateTime<Utc>,
}

impl From<ScoreRow> for Score {
    fn from(row: ScoreRow) -> Self {
        Score {
            student_id: row.student_id,
            subject: row.subject,
            score: row.score,
            grade: row.grade,
            uploaded_by: row.uploaded_by,
            uploaded_at: row.uploaded_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ComplaintRow {
    id: String,
    student: String,
    subject: String,
    content: String,
    created_at: DateTime<Utc>,
    resolved: bool,
}

impl From<ComplaintRow> for Complaint {
    fn from(row: ComplaintRow) -> Self {
        Complaint {
            id: row.id,
            student: row.student,
            subject: row.subject,
            content: row.content,
            created_at: row.created_at,
            resolved: row.resolved,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "username, password, user_type, email, reset_token";
const SCORE_COLUMNS: &str = "student_id, subject, score, grade, uploaded_by, uploaded_at";
const COMPLAINT_COLUMNS: &str = "id, student, subject, content, created_at, resolved";

// ============================================================================
// Store
// ============================================================================

#[derive(Clone)]
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn insert_account(&self, account: &Account) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, user_type, email, reset_token)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (username) DO NOTHING
            "#,
        )
        .bind(&account.username)
        .bind(&account.password)
        .bind(account.user_type.as_str())
        .bind(&account.email)
        .bind(&account.reset_token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn insert_score(&self, score: &Score) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO results (student_id, subject, score, grade, uploaded_by, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (student_id, subject) DO NOTHING
            "#,
        )
        .bind(&score.student_id)
        .bind(&score.subject)
        .bind(score.score)
        .bind(&score.grade)
        .bind(&score.uploaded_by)
        .bind(score.uploaded_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// Run `insert` over `records` in order, stopping at the first error
async fn write_each<'a, T, F, Fut>(records: &'a [T], mut insert: F) -> StoreResult<BatchWrite>
where
    F: FnMut(&'a T) -> Fut,
    Fut: std::future::Future<Output = StoreResult<bool>>,
{
    let mut batch = BatchWrite::default();
    for (index, record) in records.iter().enumerate() {
        match insert(record).await {
            Ok(true) => batch.written.push(index),
            Ok(false) => debug!(index, "Key already taken, record not written"),
            Err(e) => return Err(StoreError::partial(batch.written, records.len(), e)),
        }
    }
    Ok(batch)
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_account(&self, username: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn find_account_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users WHERE reset_token = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    #[instrument(skip(self, accounts), fields(count = accounts.len()))]
    async fn put_accounts(&self, accounts: &[Account]) -> StoreResult<BatchWrite> {
        write_each(accounts, |account| self.insert_account(account)).await
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE username = $1")
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_reset_token(&self, username: &str, token: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET reset_token = $2 WHERE username = $1")
            .bind(username)
            .bind(token)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<Option<String>> {
        let username = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE users
            SET password = $2, reset_token = NULL
            WHERE reset_token = $1
            RETURNING username
            "#,
        )
        .bind(token)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(username)
    }

    async fn get_score(&self, key: &ScoreKey) -> StoreResult<Option<Score>> {
        let row = sqlx::query_as::<_, ScoreRow>(&format!(
            "SELECT {} FROM results WHERE student_id = $1 AND subject = $2",
            SCORE_COLUMNS
        ))
        .bind(&key.student_id)
        .bind(&key.subject)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Score::from))
    }

    #[instrument(skip(self, scores), fields(count = scores.len()))]
    async fn put_scores(&self, scores: &[Score]) -> StoreResult<BatchWrite> {
        write_each(scores, |score| self.insert_score(score)).await
    }

    async fn list_scores(&self, filter: &ScoreFilter) -> StoreResult<Vec<Score>> {
        let rows = sqlx::query_as::<_, ScoreRow>(&format!(
            r#"
            SELECT {} FROM results
            WHERE ($1::TEXT IS NULL OR student_id = $1)
              AND ($2::TEXT IS NULL OR uploaded_by = $2)
            ORDER BY student_id, subject
            "#,
            SCORE_COLUMNS
        ))
        .bind(&filter.student_id)
        .bind(&filter.uploaded_by)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Score::from).collect())
    }

    async fn put_complaint(&self, complaint: &Complaint) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO complaints (id, student, subject, content, created_at, resolved)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&complaint.id)
        .bind(&complaint.student)
        .bind(&complaint.subject)
        .bind(&complaint.content)
        .bind(complaint.created_at)
        .bind(complaint.resolved)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn get_complaint(&self, id: &str) -> StoreResult<Option<Complaint>> {
        let row = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {} FROM complaints WHERE id = $1",
            COMPLAINT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Complaint::from))
    }

    async fn update_complaint(&self, complaint: &Complaint) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE complaints
            SET student = $2, subject = $3, content = $4, resolved = $5
            WHERE id = $1
            "#,
        )
        .bind(&complaint.id)
        .bind(&complaint.student)
        .bind(&complaint.subject)
        .bind(&complaint.content)
        .bind(complaint.resolved)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_complaints(&self) -> StoreResult<Vec<Complaint>> {
        let rows = sqlx::query_as::<_, ComplaintRow>(&format!(
            "SELECT {} FROM complaints ORDER BY created_at, id",
            COMPLAINT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Complaint::from).collect())
    }
}
