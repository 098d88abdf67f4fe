//! Concurrent registrations and cancellation against the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;

use identity_service::application::commands::RegisterAccountCommand;
use identity_service::application::dto::RegisterAccountRequest;
use identity_service::domain::{CredentialHasher, IdGenerator};
use identity_service::infrastructure::repositories::InMemoryAccountStore;
use identity_service::infrastructure::security::{Argon2CredentialHasher, UuidGenerator};
use identity_service::shared::context::CallContext;
use identity_service::shared::error::{AppError, ErrorCode};

use crate::common::{fake_name, fast_hasher, unique_email, STRONG_PASSWORD};

type MemoryCommand = RegisterAccountCommand<InMemoryAccountStore, InMemoryAccountStore>;

fn command_with(store: &Arc<InMemoryAccountStore>, hasher: Arc<dyn CredentialHasher>) -> MemoryCommand {
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
    RegisterAccountCommand::new(Arc::clone(store), Arc::clone(store), hasher, ids)
}

/// Hashes after a fixed delay, so a test can cancel mid-flight.
struct SlowHasher {
    delay: Duration,
    inner: Argon2CredentialHasher,
}

impl CredentialHasher for SlowHasher {
    fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        std::thread::sleep(self.delay);
        self.inner.hash(plaintext)
    }

    fn compare(&self, hash: &str, plaintext: &str) -> bool {
        self.inner.compare(hash, plaintext)
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_email_concurrently_yields_exactly_one_success() {
    let store = Arc::new(InMemoryAccountStore::new());
    let command = Arc::new(command_with(&store, Arc::new(fast_hasher())));
    let email = unique_email();

    let attempts = (0..8).map(|_| {
        let command = Arc::clone(&command);
        let request = RegisterAccountRequest::new(email.clone(), STRONG_PASSWORD, fake_name());
        tokio::spawn(async move { command.execute(&CallContext::background(), request).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completed"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(result.code(), ErrorCode::Conflict);
    }
    assert_eq!(store.accounts().len(), 1);
    assert_eq!(store.open_transactions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_emails_concurrently_all_succeed() {
    let store = Arc::new(InMemoryAccountStore::new());
    let command = Arc::new(command_with(&store, Arc::new(fast_hasher())));

    let attempts = (0..6).map(|_| {
        let command = Arc::clone(&command);
        let request = RegisterAccountRequest::new(unique_email(), STRONG_PASSWORD, fake_name());
        tokio::spawn(async move { command.execute(&CallContext::background(), request).await })
    });
    for joined in join_all(attempts).await {
        joined.expect("task completed").expect("registered");
    }

    let rows = store.accounts();
    assert_eq!(rows.len(), 6);
    let mut public_ids: Vec<_> = rows.iter().map(|r| r.public_id.clone()).collect();
    public_ids.sort();
    public_ids.dedup();
    assert_eq!(public_ids.len(), 6);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_cancellation_before_commit_leaves_nothing_visible() {
    let store = Arc::new(InMemoryAccountStore::new());
    let hasher = SlowHasher {
        delay: Duration::from_millis(300),
        inner: fast_hasher(),
    };
    let command = Arc::new(command_with(&store, Arc::new(hasher)));
    let (ctx, handle) = CallContext::new();
    let email = unique_email();

    let task = tokio::spawn({
        let command = Arc::clone(&command);
        let request = RegisterAccountRequest::new(email.clone(), STRONG_PASSWORD, fake_name());
        async move { command.execute(&ctx, request).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    handle.cancel();

    let err = task.await.expect("task completed").unwrap_err();
    assert_eq!(err.code(), ErrorCode::Internal);
    assert!(store.accounts().is_empty());
    assert_eq!(store.open_transactions(), 0);

    // The email is still free afterwards.
    command_with(&store, Arc::new(fast_hasher()))
        .execute(
            &CallContext::background(),
            RegisterAccountRequest::new(email, STRONG_PASSWORD, fake_name()),
        )
        .await
        .expect("registered after cancellation");
    assert_eq!(store.accounts().len(), 1);
}

#[tokio::test]
async fn test_failed_rollback_still_releases_transaction() {
    let store = Arc::new(InMemoryAccountStore::new());
    let command = command_with(&store, Arc::new(fast_hasher()));
    store.fail_next_insert();
    store.fail_next_rollback();

    let err = command
        .execute(
            &CallContext::background(),
            RegisterAccountRequest::new(unique_email(), STRONG_PASSWORD, fake_name()),
        )
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Internal);
    assert_eq!(err.origin(), "UnitOfWork.rollback");
    assert_eq!(store.open_transactions(), 0);
    assert!(store.accounts().is_empty());
}
