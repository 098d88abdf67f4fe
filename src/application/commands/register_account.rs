//! Register Account Command
//!
//! The single entry point of the registration workflow:
//! validation → uniqueness pre-check → credential hashing → transactional
//! insert. Every step short-circuits with a classified [`AppError`].

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use tracing::{instrument, Span};
use zeroize::Zeroize;

use crate::application::dto::{RegisterAccountRequest, RegisteredAccount};
use crate::application::services::AccountService;
use crate::domain::{
    with_transaction, Account, AccountRepository, CredentialHasher, IdGenerator, Role, Scope,
    UnitOfWork,
};
use crate::shared::context::CallContext;
use crate::shared::error::AppError;

const HASH_ORIGIN: &str = "CredentialHasher.hash";

/// Registration use case, as seen by the transport layer.
#[async_trait]
pub trait RegisterAccount: Send + Sync {
    async fn register(
        &self,
        ctx: &CallContext,
        request: RegisterAccountRequest,
    ) -> Result<RegisteredAccount, AppError>;
}

/// Registration orchestrator.
///
/// `U` and `R` must share a transaction type so the insert can run on the
/// transaction opened by the unit of work.
pub struct RegisterAccountCommand<U, R> {
    uow: Arc<U>,
    accounts: Arc<R>,
    guard: AccountService<R>,
    hasher: Arc<dyn CredentialHasher>,
    ids: Arc<dyn IdGenerator>,
}

impl<U, R> RegisterAccountCommand<U, R>
where
    U: UnitOfWork<Tx = R::Tx> + 'static,
    R: AccountRepository + 'static,
{
    pub fn new(
        uow: Arc<U>,
        accounts: Arc<R>,
        hasher: Arc<dyn CredentialHasher>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self {
            uow,
            guard: AccountService::new(Arc::clone(&accounts)),
            accounts,
            hasher,
            ids,
        }
    }

    /// Register a new account.
    ///
    /// Side effects happen in a fixed order: no I/O before validation
    /// passes, no hashing before the pre-check passes, and no transaction
    /// is open while hashing.
    #[instrument(
        name = "RegisterAccountCommand.execute",
        skip_all,
        fields(
            request_id = %ctx.request_id(),
            email = tracing::field::Empty,
            public_id = tracing::field::Empty,
        )
    )]
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: RegisterAccountRequest,
    ) -> Result<RegisteredAccount, AppError> {
        let transport = request.validate_transport();
        let RegisterAccountRequest {
            email,
            password,
            password_confirm,
            name,
        } = request;
        if let Some(mut confirm) = password_confirm {
            confirm.zeroize();
        }

        let mut account = Account::new(&email, password, name);
        account
            .assign_public_id(self.ids.generate())
            .assign_role(Role::User);

        let span = Span::current();
        span.record("email", account.email().as_str());
        span.record("public_id", account.public_id());

        let mut violations = account.validate();
        violations.merge(transport);
        if violations.has_errors() {
            tracing::warn!(errors = ?violations.errors(), "Registration rejected by validation");
            return Err(AppError::validation(&violations, "account"));
        }

        self.guard
            .ensure_email_available(ctx, account.email())
            .await?;

        let hash = self.hash_credential(ctx, &mut account).await?;
        account.assign_credential_hash(hash)?;

        let accounts = Arc::clone(&self.accounts);
        let persisted = with_transaction(&*self.uow, ctx, Scope::pool(), move |scope| {
            async move { accounts.create_user(scope, account).await }.boxed()
        })
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "Registration not persisted"))?;

        tracing::info!(id = ?persisted.id(), "Account registered");
        Ok(RegisteredAccount::from(&persisted))
    }

    /// Hash the account's plaintext on a blocking thread. The plaintext is
    /// moved off the account first and zeroized when the task ends.
    async fn hash_credential(
        &self,
        ctx: &CallContext,
        account: &mut Account,
    ) -> Result<String, AppError> {
        let credential = account
            .take_credential()
            .ok_or_else(|| AppError::hash_password("account has no credential to hash"))?;
        let hasher = Arc::clone(&self.hasher);

        ctx.run(HASH_ORIGIN, async move {
            tokio::task::spawn_blocking(move || hasher.hash(credential.expose()))
                .await
                .map_err(AppError::hash_password)?
        })
        .await
    }
}

#[async_trait]
impl<U, R> RegisterAccount for RegisterAccountCommand<U, R>
where
    U: UnitOfWork<Tx = R::Tx> + 'static,
    R: AccountRepository + 'static,
{
    async fn register(
        &self,
        ctx: &CallContext,
        request: RegisterAccountRequest,
    ) -> Result<RegisteredAccount, AppError> {
        self.execute(ctx, request).await
    }
}
