//! Record models
//!
//! Field names match the persisted layout of the `users`, `results` and
//! `complaints` tables.

use chrono::{DateTime, Utc};
use portal_common::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a complaint subject, in characters
pub const COMPLAINT_SUBJECT_MAX: usize = 100;

/// Maximum length of a complaint body, in characters
pub const COMPLAINT_CONTENT_MAX: usize = 1000;

/// Maximum length of a username or student id, in characters
pub const USERNAME_MAX: usize = 150;

/// Maximum length of an email address, in characters
pub const EMAIL_MAX: usize = 254;

/// Maximum length of a result subject, in characters
pub const RESULT_SUBJECT_MAX: usize = 150;

/// Maximum length of a grade, in characters
pub const GRADE_MAX: usize = 8;

/// Lowest accepted score
pub const SCORE_MIN: i32 = 0;

/// Highest accepted score
pub const SCORE_MAX: i32 = 100;

/// Portal account keyed by username
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub username: String,
    /// Argon2 PHC string, never plaintext
    pub password: String,
    pub user_type: Role,
    pub email: String,
    pub reset_token: Option<String>,
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("user_type", &self.user_type)
            .field("email", &self.email)
            .field("reset_pending", &self.reset_token.is_some())
            .finish_non_exhaustive()
    }
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        user_type: Role,
        email: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password_hash.into(),
            user_type,
            email: email.into(),
            reset_token: None,
        }
    }

    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            username: self.username.clone(),
            email: self.email.clone(),
            user_type: self.user_type,
        }
    }
}

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountProfile {
    pub username: String,
    pub email: String,
    pub user_type: Role,
}

/// Composite key of a score: (student, subject)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScoreKey {
    pub student_id: String,
    pub subject: String,
}

impl ScoreKey {
    pub fn new(student_id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            subject: subject.into(),
        }
    }
}

impl std::fmt::Display for ScoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.student_id, self.subject)
    }
}

/// One student's result in one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub student_id: String,
    pub subject: String,
    pub score: i32,
    pub grade: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

impl Score {
    pub fn key(&self) -> ScoreKey {
        ScoreKey::new(&self.student_id, &self.subject)
    }
}

/// Filter for score listings; all set fields must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScoreFilter {
    pub student_id: Option<String>,
    pub uploaded_by: Option<String>,
}

impl ScoreFilter {
    pub fn student(student_id: impl Into<String>) -> Self {
        Self {
            student_id: Some(student_id.into()),
            uploaded_by: None,
        }
    }

    pub fn matches(&self, score: &Score) -> bool {
        self.student_id
            .as_deref()
            .map_or(true, |id| id == score.student_id)
            && self
                .uploaded_by
                .as_deref()
                .map_or(true, |by| by == score.uploaded_by)
    }
}

/// Student complaint; `resolved` only ever moves from false to true
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complaint {
    pub id: String,
    pub student: String,
    pub subject: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub resolved: bool,
}

impl Complaint {
    /// New open complaint with a time-ordered id
    pub fn new(student: impl Into<String>, subject: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            student: student.into(),
            subject: subject.into(),
            content: content.into(),
            created_at: Utc::now(),
            resolved: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_debug_hides_credentials() {
        let mut account = Account::new("alice", "$argon2id$v=19$secret", Role::Student, "a@x.com");
        account.reset_token = Some("tok-123".to_string());

        let rendered = format!("{:?}", account);
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("argon2"));
        assert!(!rendered.contains("tok-123"));
        assert!(rendered.contains("reset_pending: true"));
    }

    #[test]
    fn test_score_filter_matches() {
        let score = Score {
            student_id: "alice".to_string(),
            subject: "math".to_string(),
            score: 90,
            grade: "A".to_string(),
            uploaded_by: "mr_smith".to_string(),
            uploaded_at: Utc::now(),
        };

        assert!(ScoreFilter::default().matches(&score));
        assert!(ScoreFilter::student("alice").matches(&score));
        assert!(!ScoreFilter::student("bob").matches(&score));

        let by_other = ScoreFilter {
            student_id: None,
            uploaded_by: Some("ms_jones".to_string()),
        };
        assert!(!by_other.matches(&score));
    }

    #[test]
    fn test_complaint_ids_are_unique_and_ordered() {
        let first = Complaint::new("alice", "Math grade", "Please re-check");
        let second = Complaint::new("alice", "Math grade", "Please re-check");
        assert_ne!(first.id, second.id);
        assert!(first.id < second.id);
        assert!(!first.resolved);
    }
}
