//! Unit of Work and Transaction Scope
//!
//! Transactional boundaries for repository operations. A transaction handle
//! is never ambient: it travels through an explicit [`Scope`] argument, and
//! repositories pick "active transaction if present, pooled connection
//! otherwise" from that scope.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;

use async_trait::async_trait;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::{debug, error, instrument, warn};

use crate::shared::context::CallContext;
use crate::shared::error::AppError;

const ORIGIN: &str = "UnitOfWork.with_transaction";

/// Where a repository call executes: on the pool, or on a borrowed
/// transaction.
pub struct Scope<'a, Tx> {
    tx: Option<&'a mut Tx>,
}

impl<'a, Tx> Scope<'a, Tx> {
    /// Non-transactional scope backed by the connection pool.
    pub fn pool() -> Self {
        Self { tx: None }
    }

    pub fn transaction(tx: &'a mut Tx) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    /// Shorter-lived copy of this scope, so one scope can serve several
    /// repository calls in sequence.
    pub fn reborrow(&mut self) -> Scope<'_, Tx> {
        Scope {
            tx: self.tx.as_deref_mut(),
        }
    }

    pub fn into_transaction(self) -> Option<&'a mut Tx> {
        self.tx
    }
}

impl<Tx> fmt::Debug for Scope<'_, Tx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("in_transaction", &self.in_transaction())
            .finish()
    }
}

/// Unit of Work trait for managing database transactions.
///
/// Owns begin/commit/rollback for one backend. The lifecycle around a unit
/// of work is driven by [`with_transaction`].
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Transaction handle.
    type Tx: Send + 'static;

    /// Backend error type, classified by [`with_transaction`].
    type Error: std::error::Error + Send + Sync + 'static;

    /// Begin a new transaction.
    async fn begin(&self) -> Result<Self::Tx, Self::Error>;

    /// Commit the transaction.
    async fn commit(&self, tx: Self::Tx) -> Result<(), Self::Error>;

    /// Rollback the transaction.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), Self::Error>;
}

enum Outcome<T> {
    Finished(Result<T, AppError>),
    Cancelled,
    Panicked(Box<dyn Any + Send>),
}

/// Execute `work` within a transaction.
///
/// - `parent` must not already be transactional; nesting fails fast with a
///   `Conflict` (`transaction_already_active`) error instead of silently
///   joining the outer transaction.
/// - On success the transaction is committed. A commit failure is returned
///   as its own `Internal` error.
/// - On failure the transaction is rolled back and the original error from
///   `work` is returned, unless the rollback fails too, in which case a
///   rollback error joining both is returned.
/// - If `ctx` is cancelled before commit, `work` is dropped, the transaction
///   is rolled back and nothing is committed.
/// - If `work` panics, the transaction is rolled back before the panic
///   continues.
///
/// The transaction handle is consumed by commit or rollback on every path.
///
/// # Example
/// ```ignore
/// let account = with_transaction(&uow, &ctx, Scope::pool(), move |scope| {
///     async move { repository.create_user(scope, account).await }.boxed()
/// })
/// .await?;
/// ```
#[instrument(
    name = "UnitOfWork.with_transaction",
    skip_all,
    fields(request_id = %ctx.request_id())
)]
pub async fn with_transaction<U, T, F>(
    uow: &U,
    ctx: &CallContext,
    parent: Scope<'_, U::Tx>,
    work: F,
) -> Result<T, AppError>
where
    U: UnitOfWork + ?Sized,
    T: Send,
    F: for<'s> FnOnce(Scope<'s, U::Tx>) -> BoxFuture<'s, Result<T, AppError>> + Send,
{
    if parent.in_transaction() {
        warn!("Refusing to start a nested transaction");
        return Err(AppError::transaction_already_active());
    }
    ctx.ensure_active(ORIGIN)?;

    let mut tx = uow.begin().await.map_err(AppError::begin_transaction)?;
    debug!("Transaction started");

    let outcome = {
        let work = AssertUnwindSafe(work(Scope::transaction(&mut tx))).catch_unwind();
        tokio::select! {
            biased;
            _ = ctx.cancelled() => Outcome::Cancelled,
            result = work => match result {
                Ok(result) => Outcome::Finished(result),
                Err(payload) => Outcome::Panicked(payload),
            },
        }
    };

    match outcome {
        Outcome::Finished(Ok(value)) => {
            if ctx.is_cancelled() {
                warn!("Cancelled before commit, rolling back");
                return Err(rollback_after(uow, tx, AppError::cancelled(ORIGIN)).await);
            }
            uow.commit(tx).await.map_err(|e| {
                error!(error = %e, "Transaction commit failed");
                AppError::commit_failed(e)
            })?;
            debug!("Transaction committed");
            Ok(value)
        }
        Outcome::Finished(Err(error)) => Err(rollback_after(uow, tx, error).await),
        Outcome::Cancelled => {
            warn!("Cancelled during unit of work, rolling back");
            Err(rollback_after(uow, tx, AppError::cancelled(ORIGIN)).await)
        }
        Outcome::Panicked(payload) => {
            if let Err(e) = uow.rollback(tx).await {
                error!(error = %e, "Rollback after panic failed");
            }
            std::panic::resume_unwind(payload)
        }
    }
}

async fn rollback_after<U>(uow: &U, tx: U::Tx, error: AppError) -> AppError
where
    U: UnitOfWork + ?Sized,
{
    match uow.rollback(tx).await {
        Ok(()) => {
            debug!(origin = %error.origin(), "Transaction rolled back");
            error
        }
        Err(rollback) => {
            error!(error = %rollback, "Transaction rollback failed");
            AppError::rollback_failed(error, rollback)
        }
    }
}
