//! In-Memory Account Store
//!
//! A transactional, process-local implementation of both
//! [`UnitOfWork`] and [`AccountRepository`]. Used when the configured
//! backend is `memory` and by the test suites.
//!
//! Semantics mirror the PostgreSQL backend closely enough for the
//! registration workflow:
//! - rows staged inside a transaction are invisible to other callers until
//!   commit and are discarded on rollback
//! - email uniqueness among live rows is enforced at insert time, including
//!   against emails reserved by other open transactions
//! - a transaction that is dropped without commit or rollback releases its
//!   reservations

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::domain::{Account, AccountRepository, Email, Scope, StoredAccount, UnitOfWork};
use crate::shared::error::AppError;

/// Failures raised by the in-memory store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryStoreError {
    #[error("duplicate key value violates unique constraint \"users_email_key\": {0}")]
    DuplicateEmail(String),

    #[error("account has no credential hash")]
    MissingCredentialHash,

    #[error("injected {0} failure")]
    Injected(&'static str),
}

#[derive(Debug, Default)]
struct FailNext {
    insert: bool,
    find: bool,
    commit: bool,
    rollback: bool,
}

#[derive(Debug, Default)]
struct StoreState {
    rows: Vec<StoredAccount>,
    /// email -> id of the transaction holding it
    reserved: HashMap<String, u64>,
    next_id: i64,
    next_tx: u64,
    open: usize,
    insert_calls: usize,
    find_calls: usize,
    fail_next: FailNext,
}

impl StoreState {
    fn live_row(&self, email: &str) -> Option<&StoredAccount> {
        self.rows
            .iter()
            .find(|row| row.email == email && row.deleted_at.is_none())
    }

    fn release(&mut self, tx_id: u64) {
        self.reserved.retain(|_, holder| *holder != tx_id);
        self.open = self.open.saturating_sub(1);
    }
}

/// Transaction handle for [`InMemoryAccountStore`].
#[derive(Debug)]
pub struct MemoryTransaction {
    id: u64,
    staged: Vec<StoredAccount>,
    state: Arc<Mutex<StoreState>>,
}

impl Drop for MemoryTransaction {
    fn drop(&mut self) {
        self.state.lock().release(self.id);
    }
}

/// Process-local account store. Clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccountStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Committed rows, in insertion order.
    pub fn accounts(&self) -> Vec<StoredAccount> {
        self.state.lock().rows.clone()
    }

    pub fn open_transactions(&self) -> usize {
        self.state.lock().open
    }

    pub fn insert_calls(&self) -> usize {
        self.state.lock().insert_calls
    }

    pub fn find_calls(&self) -> usize {
        self.state.lock().find_calls
    }

    pub fn fail_next_insert(&self) {
        self.state.lock().fail_next.insert = true;
    }

    pub fn fail_next_find(&self) {
        self.state.lock().fail_next.find = true;
    }

    pub fn fail_next_commit(&self) {
        self.state.lock().fail_next.commit = true;
    }

    pub fn fail_next_rollback(&self) {
        self.state.lock().fail_next.rollback = true;
    }

    fn insert(
        &self,
        tx: Option<&mut MemoryTransaction>,
        account: &Account,
    ) -> Result<StoredAccount, MemoryStoreError> {
        let mut state = self.state.lock();
        state.insert_calls += 1;
        if std::mem::take(&mut state.fail_next.insert) {
            return Err(MemoryStoreError::Injected("insert"));
        }

        let email = account.email().as_str().to_owned();
        if state.live_row(&email).is_some() || state.reserved.contains_key(&email) {
            return Err(MemoryStoreError::DuplicateEmail(email));
        }
        let password_hash = account
            .credential_hash()
            .ok_or(MemoryStoreError::MissingCredentialHash)?
            .to_owned();

        state.next_id += 1;
        let now = Utc::now();
        let row = StoredAccount {
            id: state.next_id,
            public_id: account.public_id().to_owned(),
            email: email.clone(),
            password_hash,
            name: account.name().to_owned(),
            role: account.role().unwrap_or_default().as_str().to_owned(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        match tx {
            Some(tx) => {
                state.reserved.insert(email, tx.id);
                tx.staged.push(row.clone());
            }
            None => state.rows.push(row.clone()),
        }
        Ok(row)
    }
}

#[async_trait]
impl UnitOfWork for InMemoryAccountStore {
    type Tx = MemoryTransaction;
    type Error = MemoryStoreError;

    async fn begin(&self) -> Result<MemoryTransaction, MemoryStoreError> {
        let mut state = self.state.lock();
        state.next_tx += 1;
        state.open += 1;
        Ok(MemoryTransaction {
            id: state.next_tx,
            staged: Vec::new(),
            state: Arc::clone(&self.state),
        })
    }

    async fn commit(&self, mut tx: MemoryTransaction) -> Result<(), MemoryStoreError> {
        let mut state = self.state.lock();
        if std::mem::take(&mut state.fail_next.commit) {
            return Err(MemoryStoreError::Injected("commit"));
        }
        state.rows.append(&mut tx.staged);
        Ok(())
    }

    async fn rollback(&self, mut tx: MemoryTransaction) -> Result<(), MemoryStoreError> {
        tx.staged.clear();
        if std::mem::take(&mut self.state.lock().fail_next.rollback) {
            return Err(MemoryStoreError::Injected("rollback"));
        }
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountStore {
    type Tx = MemoryTransaction;

    async fn create_user(
        &self,
        scope: Scope<'_, MemoryTransaction>,
        mut account: Account,
    ) -> Result<Account, AppError> {
        let row = self
            .insert(scope.into_transaction(), &account)
            .map_err(|e| match e {
                MemoryStoreError::DuplicateEmail(_) => AppError::duplicate_email(e),
                other => AppError::create_user(other),
            })?;

        account.mark_persisted(row.id, row.created_at, row.updated_at);
        Ok(account)
    }

    async fn find_user_by_email(
        &self,
        scope: Scope<'_, MemoryTransaction>,
        email: &Email,
    ) -> Result<Option<Account>, AppError> {
        let tx = scope.into_transaction();
        let mut state = self.state.lock();
        state.find_calls += 1;
        if std::mem::take(&mut state.fail_next.find) {
            return Err(AppError::find_user_by_email(MemoryStoreError::Injected("find")));
        }

        let staged = tx.and_then(|tx| {
            tx.staged
                .iter()
                .find(|row| row.email == email.as_str())
                .cloned()
        });
        let found = staged.or_else(|| state.live_row(email.as_str()).cloned());
        Ok(found.map(Account::from))
    }
}
