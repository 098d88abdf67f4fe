//! Account Service
//!
//! Optimistic uniqueness guard run before any credential work. The
//! authoritative check is the store's unique constraint; this read only
//! rejects the common case early.

use std::sync::Arc;

use tracing::instrument;

use crate::domain::{AccountRepository, Email, Scope};
use crate::shared::context::CallContext;
use crate::shared::error::AppError;

const ORIGIN: &str = "AccountService.ensure_email_available";

pub struct AccountService<R> {
    accounts: Arc<R>,
}

impl<R> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<R: AccountRepository> AccountService<R> {
    pub fn new(accounts: Arc<R>) -> Self {
        Self { accounts }
    }

    /// `Conflict` if a live account already uses `email`. Lookup failures
    /// are returned as classified by the repository.
    #[instrument(name = "AccountService.ensure_email_available", skip_all, fields(email = %email))]
    pub async fn ensure_email_available(
        &self,
        ctx: &CallContext,
        email: &Email,
    ) -> Result<(), AppError> {
        let existing = ctx
            .run(ORIGIN, self.accounts.find_user_by_email(Scope::pool(), email))
            .await?;

        match existing {
            Some(account) => {
                tracing::info!(public_id = %account.public_id(), "Email already registered");
                Err(AppError::email_already_exists(account.public_id()))
            }
            None => Ok(()),
        }
    }
}
