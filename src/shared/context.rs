//! Call Context
//!
//! Per-request context threaded explicitly through the registration path.
//! Carries a request id for log correlation and a cancellation signal.

use std::future::Future;

use tokio::sync::watch;
use uuid::Uuid;

use super::error::AppError;

/// Request-scoped context. Cheap to clone; clones observe the same
/// cancellation signal.
#[derive(Debug, Clone)]
pub struct CallContext {
    request_id: Uuid,
    cancelled: watch::Receiver<bool>,
}

/// Owner side of a [`CallContext`] cancellation signal.
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CallContext {
    /// Create a cancellable context and its handle.
    pub fn new() -> (Self, CancelHandle) {
        let (sender, cancelled) = watch::channel(false);
        let ctx = Self {
            request_id: Uuid::new_v4(),
            cancelled,
        };
        (ctx, CancelHandle { sender })
    }

    /// Context that is never cancelled.
    pub fn background() -> Self {
        let (ctx, _handle) = Self::new();
        ctx
    }

    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancelled.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves for a
    /// context whose handle was dropped without cancelling.
    pub async fn cancelled(&self) {
        let mut rx = self.cancelled.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Fail fast with a classified error if cancellation was requested.
    pub fn ensure_active(&self, origin: &str) -> Result<(), AppError> {
        if self.is_cancelled() {
            return Err(AppError::cancelled(origin));
        }
        Ok(())
    }

    /// Race `operation` against cancellation. The operation future is
    /// dropped as soon as cancellation is observed.
    pub async fn run<T, F>(&self, origin: &str, operation: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        self.ensure_active(origin)?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(AppError::cancelled(origin)),
            result = operation => result,
        }
    }
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}
