//! Unit of Work Pattern Implementation
//!
//! PostgreSQL transaction lifecycle for [`with_transaction`](crate::domain::with_transaction).

use std::time::Instant;

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::UnitOfWork;
use crate::infrastructure::metrics;

/// Transaction handle used by PostgreSQL repositories.
pub type PgTransaction = Transaction<'static, Postgres>;

/// PostgreSQL Unit of Work implementation.
///
/// Obtains one pooled connection per transaction; commit and rollback both
/// consume the handle, which returns the connection to the pool.
#[derive(Clone)]
pub struct PgUnitOfWork {
    pool: PgPool,
}

impl PgUnitOfWork {
    /// Create a new Unit of Work instance.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    type Tx = PgTransaction;
    type Error = sqlx::Error;

    async fn begin(&self) -> Result<PgTransaction, sqlx::Error> {
        let start = Instant::now();
        let result = self.pool.begin().await;
        metrics::record_db_query("begin", "transaction", start.elapsed().as_secs_f64());
        result
    }

    async fn commit(&self, tx: PgTransaction) -> Result<(), sqlx::Error> {
        let start = Instant::now();
        let result = tx.commit().await;
        metrics::record_db_query("commit", "transaction", start.elapsed().as_secs_f64());
        metrics::record_transaction(if result.is_ok() { "committed" } else { "commit_failed" });
        result
    }

    async fn rollback(&self, tx: PgTransaction) -> Result<(), sqlx::Error> {
        let start = Instant::now();
        let result = tx.rollback().await;
        metrics::record_db_query("rollback", "transaction", start.elapsed().as_secs_f64());
        metrics::record_transaction(if result.is_ok() { "rolled_back" } else { "rollback_failed" });
        result
    }
}
