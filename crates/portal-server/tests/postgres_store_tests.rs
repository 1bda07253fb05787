//! PostgreSQL record store tests using testcontainers
//!
//! These tests require Docker to be running. Run with:
//!
//! ```bash
//! cargo test --test postgres_store_tests -- --ignored --nocapture
//! ```

mod common;

use anyhow::{Context, Result};
use chrono::Utc;
use portal_common::Role;
use portal_server::{
    db::{self, PgRecordStore, RecordStore},
    models::{Account, Complaint, Score, ScoreFilter, ScoreKey},
};
use sqlx::postgres::PgPoolOptions;
use testcontainers::{core::IntoContainerPort, runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::postgres::Postgres;

/// PostgreSQL container with migrations applied
struct TestPostgres {
    _container: ContainerAsync<Postgres>,
    store: PgRecordStore,
}

impl TestPostgres {
    async fn start() -> Result<Self> {
        common::init_test_tracing();

        let container = Postgres::default()
            .start()
            .await
            .context("Failed to start PostgreSQL container")?;
        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(5432.tcp()).await?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&format!(
                "postgresql://postgres:postgres@{}:{}/postgres",
                host, port
            ))
            .await
            .context("Failed to connect to PostgreSQL")?;
        db::run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            store: PgRecordStore::new(pool),
        })
    }
}

fn score(student_id: &str, subject: &str, value: i32, uploaded_by: &str) -> Score {
    Score {
        student_id: student_id.to_string(),
        subject: subject.to_string(),
        score: value,
        grade: "A".to_string(),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at: Utc::now(),
    }
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_accounts_insert_if_absent() -> Result<()> {
    let pg = TestPostgres::start().await?;
    let store = &pg.store;

    let alice = Account::new("alice", "$argon2id$hash-a", Role::Staff, "a@x.com");
    let bob = Account::new("bob", "$argon2id$hash-b", Role::Student, "b@x.com");

    let batch = store.put_accounts(&[alice.clone(), bob.clone()]).await?;
    assert_eq!(batch.written, vec![0, 1]);

    let again = Account::new("alice", "$argon2id$other", Role::Admin, "z@x.com");
    let batch = store.put_accounts(&[again]).await?;
    assert_eq!(batch.count(), 0);

    let stored = store.get_account("alice").await?.unwrap();
    assert_eq!(stored, alice);
    assert!(store.get_account("carol").await?.is_none());
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_reset_token_consumed_once() -> Result<()> {
    let pg = TestPostgres::start().await?;
    let store = &pg.store;

    let alice = Account::new("alice", "$argon2id$hash-a", Role::Student, "a@x.com");
    store.put_accounts(std::slice::from_ref(&alice)).await?;

    assert!(store.set_reset_token("alice", "token-1").await?);
    let found = store.find_account_by_reset_token("token-1").await?.unwrap();
    assert_eq!(found.username, "alice");

    let consumed = store
        .consume_reset_token("token-1", "$argon2id$hash-new")
        .await?;
    assert_eq!(consumed.as_deref(), Some("alice"));
    assert!(store
        .consume_reset_token("token-1", "$argon2id$hash-other")
        .await?
        .is_none());
    assert!(store.find_account_by_reset_token("token-1").await?.is_none());

    let stored = store.get_account("alice").await?.unwrap();
    assert_eq!(stored.password, "$argon2id$hash-new");

    assert!(store.set_password("alice", "$argon2id$hash-c").await?);
    assert!(!store.set_password("ghost", "x").await?);
    assert!(!store.set_reset_token("ghost", "token-2").await?);
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_scores_keep_first_write_and_filter() -> Result<()> {
    let pg = TestPostgres::start().await?;
    let store = &pg.store;

    let batch = store
        .put_scores(&[
            score("alice", "math", 91, "mr_smith"),
            score("alice", "art", 85, "ms_jones"),
            score("bob", "math", 70, "mr_smith"),
        ])
        .await?;
    assert_eq!(batch.count(), 3);

    let batch = store
        .put_scores(&[score("alice", "math", 10, "ms_jones")])
        .await?;
    assert_eq!(batch.count(), 0);
    let math = store.get_score(&ScoreKey::new("alice", "math")).await?.unwrap();
    assert_eq!(math.score, 91);

    let alice = store.list_scores(&ScoreFilter::student("alice")).await?;
    let subjects: Vec<_> = alice.iter().map(|s| s.subject.as_str()).collect();
    assert_eq!(subjects, vec!["art", "math"]);

    let by_smith = store
        .list_scores(&ScoreFilter {
            student_id: None,
            uploaded_by: Some("mr_smith".to_string()),
        })
        .await?;
    assert_eq!(by_smith.len(), 2);

    assert_eq!(store.list_scores(&ScoreFilter::default()).await?.len(), 3);
    Ok(())
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_complaint_lifecycle() -> Result<()> {
    let pg = TestPostgres::start().await?;
    let store = &pg.store;

    let mut complaint = Complaint::new("alice", "Math grade", "Please recheck");
    assert!(store.put_complaint(&complaint).await?);
    assert!(!store.put_complaint(&complaint).await?);

    complaint.resolved = true;
    assert!(store.update_complaint(&complaint).await?);
    let stored = store.get_complaint(&complaint.id).await?.unwrap();
    assert!(stored.resolved);
    assert_eq!(stored.student, "alice");

    let missing = Complaint::new("bob", "x", "y");
    assert!(!store.update_complaint(&missing).await?);
    assert_eq!(store.list_complaints().await?.len(), 1);

    store.ping().await?;
    Ok(())
}
