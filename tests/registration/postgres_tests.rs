//! Round trips against a real PostgreSQL database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use futures::future::join_all;
use futures::FutureExt;
use sqlx::PgPool;

use identity_service::application::commands::RegisterAccountCommand;
use identity_service::application::dto::RegisterAccountRequest;
use identity_service::config::{DatabaseBackend, DatabaseSettings};
use identity_service::domain::{with_transaction, Account, AccountRepository, IdGenerator, Role, Scope};
use identity_service::infrastructure::database::{self, PgUnitOfWork};
use identity_service::infrastructure::repositories::PgAccountRepository;
use identity_service::infrastructure::security::UuidGenerator;
use identity_service::shared::context::CallContext;
use identity_service::shared::error::ErrorCode;

use crate::common::{fake_name, fast_hasher, unique_email, STRONG_PASSWORD};

async fn migrated_pool() -> PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let settings = DatabaseSettings {
        backend: DatabaseBackend::Postgres,
        url,
        max_connections: 10,
        min_connections: 1,
        acquire_timeout: 5,
        run_migrations: true,
    };
    let pool = database::create_pool(&settings).await.expect("pool");
    database::run_migrations(&pool).await.expect("migrations");
    pool
}

fn command(pool: &PgPool) -> RegisterAccountCommand<PgUnitOfWork, PgAccountRepository> {
    let ids: Arc<dyn IdGenerator> = Arc::new(UuidGenerator);
    RegisterAccountCommand::new(
        Arc::new(PgUnitOfWork::new(pool.clone())),
        Arc::new(PgAccountRepository::new(pool.clone())),
        Arc::new(fast_hasher()),
        ids,
    )
}

/// An account ready for insert, bypassing the pre-check.
fn hashed_account(email: &str, public_id: &str) -> Account {
    let mut account = Account::new(email, STRONG_PASSWORD, fake_name());
    account.assign_public_id(public_id).assign_role(Role::User);
    account.take_credential();
    account
        .assign_credential_hash("$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA")
        .expect("hash assigned");
    account
}

async fn rows_for(pool: &PgPool, email: &str) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE email = $1")
        .bind(email.to_lowercase())
        .fetch_one(pool)
        .await
        .expect("count");
    count
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_postgres_registration_round_trip() {
    let pool = migrated_pool().await;
    let command = command(&pool);
    let ctx = CallContext::background();
    let email = unique_email();

    let registered = command
        .execute(
            &ctx,
            RegisterAccountRequest::new(email.clone(), STRONG_PASSWORD, fake_name()),
        )
        .await
        .expect("registered");
    assert_eq!(registered.role, "user");

    let err = command
        .execute(
            &ctx,
            RegisterAccountRequest::new(email.to_uppercase(), STRONG_PASSWORD, fake_name()),
        )
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    let stored: (String,) = sqlx::query_as("SELECT password_hash FROM users WHERE email = $1")
        .bind(&email)
        .fetch_one(&pool)
        .await
        .expect("row");
    assert!(stored.0.starts_with("$argon2id$"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unique_index_rejects_duplicate_on_pool() {
    let pool = migrated_pool().await;
    let repository = PgAccountRepository::new(pool.clone());
    let email = unique_email();

    repository
        .create_user(Scope::pool(), hashed_account(&email, &UuidGenerator.generate()))
        .await
        .expect("first insert");
    let err = repository
        .create_user(Scope::pool(), hashed_account(&email, &UuidGenerator.generate()))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.origin(), "AccountRepository.create_user");
    assert_eq!(rows_for(&pool, &email).await, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_unique_index_rejects_duplicate_inside_transaction() {
    let pool = migrated_pool().await;
    let repository = Arc::new(PgAccountRepository::new(pool.clone()));
    let uow = PgUnitOfWork::new(pool.clone());
    let ctx = CallContext::background();
    let email = unique_email();

    repository
        .create_user(Scope::pool(), hashed_account(&email, &UuidGenerator.generate()))
        .await
        .expect("first insert");

    let account = hashed_account(&email, &UuidGenerator.generate());
    let repo = Arc::clone(&repository);
    let err = with_transaction(&uow, &ctx, Scope::pool(), move |scope| {
        async move { repo.create_user(scope, account).await }.boxed()
    })
    .await
    .unwrap_err();

    // The constraint error itself, not a follow-up "transaction is aborted".
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.origin(), "AccountRepository.create_user");
    assert_eq!(rows_for(&pool, &email).await, 1);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_public_id_collision_is_not_reported_as_duplicate_email() {
    let pool = migrated_pool().await;
    let repository = PgAccountRepository::new(pool.clone());
    let public_id = UuidGenerator.generate();

    repository
        .create_user(Scope::pool(), hashed_account(&unique_email(), &public_id))
        .await
        .expect("first insert");
    let err = repository
        .create_user(Scope::pool(), hashed_account(&unique_email(), &public_id))
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::Internal);
    assert_eq!(err.origin(), "AccountRepository.create_user");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires DATABASE_URL"]
async fn test_concurrent_transactions_leave_one_row() {
    let pool = migrated_pool().await;
    let repository = Arc::new(PgAccountRepository::new(pool.clone()));
    let uow = Arc::new(PgUnitOfWork::new(pool.clone()));
    let email = unique_email();

    let attempts = (0..8).map(|_| {
        let repository = Arc::clone(&repository);
        let uow = Arc::clone(&uow);
        let account = hashed_account(&email, &UuidGenerator.generate());
        tokio::spawn(async move {
            let ctx = CallContext::background();
            with_transaction(&*uow, &ctx, Scope::pool(), move |scope| {
                async move { repository.create_user(scope, account).await }.boxed()
            })
            .await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task finished"))
        .collect();

    let created = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(created, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert_eq!(err.code(), ErrorCode::Conflict);
        assert_eq!(err.origin(), "AccountRepository.create_user");
    }
    assert_eq!(rows_for(&pool, &email).await, 1);
}
