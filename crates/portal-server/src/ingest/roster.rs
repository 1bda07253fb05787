//! Roster ingestion: one account per `username,email` row

use async_trait::async_trait;
use futures::future::join_all;
use portal_common::{Role, Secret};
use tracing::{debug, warn};

use super::{IngestContext, IngestError, IngestPlan, NotifyOutcome, Row};
use crate::credentials;
use crate::db::{BatchWrite, RecordStore, StoreError};
use crate::models::{Account, EMAIL_MAX, USERNAME_MAX};
use crate::notify::fan_out;

const REQUIRED_FIELDS: &[&str] = &["username", "email"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterDraft {
    pub username: String,
    pub email: String,
}

/// Welcome data kept in memory until the account is written
pub struct Welcome {
    username: String,
    email: String,
    temporary_password: Secret,
}

pub struct RosterPlan {
    role: Role,
}

impl RosterPlan {
    pub fn new(role: Role) -> Self {
        Self { role }
    }
}

#[async_trait]
impl IngestPlan for RosterPlan {
    type Draft = RosterDraft;
    type Key = String;
    type Record = Account;
    type Pending = Welcome;

    fn name(&self) -> &'static str {
        match self.role {
            Role::Staff => "staff-roster",
            Role::Student => "student-roster",
            Role::Admin => "admin-roster",
        }
    }

    fn archive_category(&self) -> &'static str {
        match self.role {
            Role::Staff => "staff",
            Role::Student => "students",
            Role::Admin => "admins",
        }
    }

    fn required_fields(&self) -> &'static [&'static str] {
        REQUIRED_FIELDS
    }

    fn parse_row(&self, row: &Row) -> Result<RosterDraft, IngestError> {
        let username = row
            .non_blank("username")
            .ok_or_else(|| IngestError::validation(row, "username is required"))?;
        let email = row
            .non_blank("email")
            .ok_or_else(|| IngestError::validation(row, format!("email is required for {}", username)))?;
        IngestError::check_length(row, "username", username, USERNAME_MAX)?;
        IngestError::check_length(row, "email", email, EMAIL_MAX)?;

        Ok(RosterDraft {
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    fn draft_key(&self, draft: &RosterDraft) -> String {
        draft.username.clone()
    }

    async fn exists(&self, store: &dyn RecordStore, key: &String) -> Result<bool, StoreError> {
        Ok(store.get_account(key).await?.is_some())
    }

    async fn materialize(&self, draft: RosterDraft) -> Result<(Account, Welcome), IngestError> {
        let temporary_password = credentials::temporary_password();
        let hash = credentials::hash_password_blocking(temporary_password.clone()).await?;
        debug!(username = %draft.username, "Generated temporary credentials");

        let account = Account::new(&draft.username, hash, self.role, &draft.email);
        let welcome = Welcome {
            username: draft.username,
            email: draft.email,
            temporary_password,
        };
        Ok((account, welcome))
    }

    async fn write_batch(
        &self,
        store: &dyn RecordStore,
        records: &[Account],
    ) -> Result<BatchWrite, StoreError> {
        store.put_accounts(records).await
    }

    async fn notify(&self, ctx: &IngestContext, pending: Vec<Welcome>) -> NotifyOutcome {
        join_all(pending.iter().map(|welcome| async move {
            if let Err(e) = ctx.notifier.subscribe(&welcome.email).await {
                warn!(username = %welcome.username, error = %e, "Subscription failed");
            }
        }))
        .await;

        let notifications: Vec<_> = pending
            .iter()
            .map(|welcome| {
                ctx.messages.account_created(
                    self.role,
                    &welcome.username,
                    &welcome.temporary_password,
                    &welcome.email,
                )
            })
            .collect();

        let report = fan_out(ctx.notifier.as_ref(), &notifications).await;
        NotifyOutcome {
            sent: report.sent,
            failed: report.failed,
            unaddressed: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::csv;

    fn rows(data: &[u8]) -> Vec<Row> {
        csv::open(data, REQUIRED_FIELDS)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_parse_row_trims_values() {
        let plan = RosterPlan::new(Role::Student);
        let rows = rows(b"username,email\n alice , a@x.com \n");
        let draft = plan.parse_row(&rows[0]).unwrap();
        assert_eq!(
            draft,
            RosterDraft {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_row_requires_email() {
        let plan = RosterPlan::new(Role::Staff);
        let rows = rows(b"username,email\nalice,\n");
        assert!(matches!(
            plan.parse_row(&rows[0]),
            Err(IngestError::Validation { line: 2, .. })
        ));
    }

    #[test]
    fn test_archive_category_per_role() {
        assert_eq!(RosterPlan::new(Role::Staff).archive_category(), "staff");
        assert_eq!(RosterPlan::new(Role::Student).archive_category(), "students");
    }

    #[tokio::test]
    async fn test_materialize_hashes_temporary_password() {
        let plan = RosterPlan::new(Role::Student);
        let (account, welcome) = plan
            .materialize(RosterDraft {
                username: "alice".to_string(),
                email: "a@x.com".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(account.user_type, Role::Student);
        assert_ne!(account.password, welcome.temporary_password.expose());
        assert!(credentials::verify_password(
            &welcome.temporary_password,
            &account.password
        ));
    }
}
