//! In-process record store for tests and local runs

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{BatchWrite, RecordStore, StoreError, StoreResult};
use crate::models::{Account, Complaint, Score, ScoreFilter, ScoreKey};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<String, Account>,
    scores: BTreeMap<ScoreKey, Score>,
    complaints: BTreeMap<String, Complaint>,
    /// Remaining successful record writes before the store starts failing
    write_budget: Option<usize>,
    unavailable: bool,
}

impl Tables {
    fn check_available(&self) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn charge_write(&mut self) -> StoreResult<()> {
        self.check_available()?;
        match self.write_budget.as_mut() {
            Some(0) => Err(StoreError::Unavailable("write budget exhausted".to_string())),
            Some(remaining) => {
                *remaining -= 1;
                Ok(())
            },
            None => Ok(()),
        }
    }
}

#[derive(Default)]
pub struct MemoryRecordStore {
    tables: RwLock<Tables>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `writes` more record writes, then fail every write
    pub async fn fail_after_writes(&self, writes: usize) {
        self.tables.write().await.write_budget = Some(writes);
    }

    /// Toggle failure of every operation
    pub async fn set_unavailable(&self, unavailable: bool) {
        self.tables.write().await.unavailable = unavailable;
    }

    pub async fn account_count(&self) -> usize {
        self.tables.read().await.accounts.len()
    }

    pub async fn score_count(&self) -> usize {
        self.tables.read().await.scores.len()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn ping(&self) -> StoreResult<()> {
        self.tables.read().await.check_available()
    }

    async fn get_account(&self, username: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        Ok(tables.accounts.get(username).cloned())
    }

    async fn find_account_by_reset_token(&self, token: &str) -> StoreResult<Option<Account>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        Ok(tables
            .accounts
            .values()
            .find(|account| account.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn put_accounts(&self, accounts: &[Account]) -> StoreResult<BatchWrite> {
        let mut tables = self.tables.write().await;
        tables.check_available()?;
        let mut batch = BatchWrite::default();
        for (index, account) in accounts.iter().enumerate() {
            if tables.accounts.contains_key(&account.username) {
                continue;
            }
            if let Err(e) = tables.charge_write() {
                return Err(StoreError::partial(batch.written, accounts.len(), e));
            }
            tables
                .accounts
                .insert(account.username.clone(), account.clone());
            batch.written.push(index);
        }
        Ok(batch)
    }

    async fn set_password(&self, username: &str, password_hash: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.check_available()?;
        if !tables.accounts.contains_key(username) {
            return Ok(false);
        }
        tables.charge_write()?;
        if let Some(account) = tables.accounts.get_mut(username) {
            account.password = password_hash.to_string();
        }
        Ok(true)
    }

    async fn set_reset_token(&self, username: &str, token: &str) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        tables.check_available()?;
        if !tables.accounts.contains_key(username) {
            return Ok(false);
        }
        tables.charge_write()?;
        if let Some(account) = tables.accounts.get_mut(username) {
            account.reset_token = Some(token.to_string());
        }
        Ok(true)
    }

    async fn consume_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> StoreResult<Option<String>> {
        let mut tables = self.tables.write().await;
        tables.check_available()?;
        let Some(username) = tables
            .accounts
            .values()
            .find(|account| account.reset_token.as_deref() == Some(token))
            .map(|account| account.username.clone())
        else {
            return Ok(None);
        };
        tables.charge_write()?;
        if let Some(account) = tables.accounts.get_mut(&username) {
            account.password = password_hash.to_string();
            account.reset_token = None;
        }
        Ok(Some(username))
    }

    async fn get_score(&self, key: &ScoreKey) -> StoreResult<Option<Score>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        Ok(tables.scores.get(key).cloned())
    }

    async fn put_scores(&self, scores: &[Score]) -> StoreResult<BatchWrite> {
        let mut tables = self.tables.write().await;
        tables.check_available()?;
        let mut batch = BatchWrite::default();
        for (index, score) in scores.iter().enumerate() {
            let key = score.key();
            if tables.scores.contains_key(&key) {
                continue;
            }
            if let Err(e) = tables.charge_write() {
                return Err(StoreError::partial(batch.written, scores.len(), e));
            }
            tables.scores.insert(key, score.clone());
            batch.written.push(index);
        }
        Ok(batch)
    }

    async fn list_scores(&self, filter: &ScoreFilter) -> StoreResult<Vec<Score>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        Ok(tables
            .scores
            .values()
            .filter(|score| filter.matches(score))
            .cloned()
            .collect())
    }

    async fn put_complaint(&self, complaint: &Complaint) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if tables.complaints.contains_key(&complaint.id) {
            tables.check_available()?;
            return Ok(false);
        }
        tables.charge_write()?;
        tables
            .complaints
            .insert(complaint.id.clone(), complaint.clone());
        Ok(true)
    }

    async fn get_complaint(&self, id: &str) -> StoreResult<Option<Complaint>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        Ok(tables.complaints.get(id).cloned())
    }

    async fn update_complaint(&self, complaint: &Complaint) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        if !tables.complaints.contains_key(&complaint.id) {
            tables.check_available()?;
            return Ok(false);
        }
        tables.charge_write()?;
        tables
            .complaints
            .insert(complaint.id.clone(), complaint.clone());
        Ok(true)
    }

    async fn list_complaints(&self) -> StoreResult<Vec<Complaint>> {
        let tables = self.tables.read().await;
        tables.check_available()?;
        let mut complaints: Vec<Complaint> = tables.complaints.values().cloned().collect();
        complaints.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(complaints)
    }
}
