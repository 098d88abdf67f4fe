//! Account Repository Implementation
//!
//! PostgreSQL implementation of the AccountRepository trait.
//! Maps between the `users` table and the domain Account aggregate.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use crate::domain::{Account, AccountRepository, Email, Scope, StoredAccount};
use crate::infrastructure::database::PgTransaction;
use crate::infrastructure::metrics;
use crate::shared::error::AppError;

const INSERT_USER: &str = r#"
    INSERT INTO users (public_id, email, password_hash, name, role)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, created_at, updated_at
"#;

const SELECT_USER_BY_EMAIL: &str = r#"
    SELECT id, public_id, email, password_hash, name, role,
           created_at, updated_at, deleted_at
    FROM users
    WHERE email = $1 AND deleted_at IS NULL
"#;

/// Database row representation of the users table.
#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    public_id: String,
    email: String,
    password_hash: String,
    name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<AccountRow> for StoredAccount {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            public_id: row.public_id,
            email: row.email,
            password_hash: row.password_hash,
            name: row.name,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Columns assigned by the database on insert.
#[derive(Debug, sqlx::FromRow)]
struct InsertedRow {
    id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// PostgreSQL account repository.
///
/// Runs each statement on the scope's transaction when there is one and on
/// the pool otherwise.
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Partial unique index over live emails, see `migrations/`.
const EMAIL_CONSTRAINT: &str = "users_email_active_key";

fn is_duplicate_email(error: &sqlx::Error) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_err)
            if db_err.is_unique_violation() && db_err.constraint() == Some(EMAIL_CONSTRAINT)
    )
}

/// Only the email index means "already registered". Any other unique
/// violation (a `public_id` collision) is an internal failure.
fn classify_insert_error(error: sqlx::Error) -> AppError {
    if is_duplicate_email(&error) {
        tracing::info!("Unique email constraint rejected insert");
        AppError::duplicate_email(error)
    } else {
        tracing::error!(error = %error, "Failed to insert user");
        AppError::create_user(error)
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    type Tx = PgTransaction;

    #[instrument(
        name = "AccountRepository.create_user",
        skip_all,
        fields(in_transaction = scope.in_transaction())
    )]
    async fn create_user(
        &self,
        scope: Scope<'_, PgTransaction>,
        mut account: Account,
    ) -> Result<Account, AppError> {
        let password_hash = account
            .credential_hash()
            .ok_or_else(|| AppError::create_user("account has no credential hash"))?
            .to_owned();
        let role = account.role().unwrap_or_default();

        let query = || {
            sqlx::query_as::<_, InsertedRow>(INSERT_USER)
                .bind(account.public_id())
                .bind(account.email().as_str())
                .bind(password_hash.as_str())
                .bind(account.name())
                .bind(role.as_str())
        };

        let start = Instant::now();
        let result = match scope.into_transaction() {
            Some(tx) => query().fetch_one(&mut **tx).await,
            None => query().fetch_one(&self.pool).await,
        };
        metrics::record_db_query("insert", "users", start.elapsed().as_secs_f64());

        let row = result.map_err(classify_insert_error)?;

        account.mark_persisted(row.id, row.created_at, row.updated_at);
        Ok(account)
    }

    #[instrument(
        name = "AccountRepository.find_user_by_email",
        skip_all,
        fields(in_transaction = scope.in_transaction())
    )]
    async fn find_user_by_email(
        &self,
        scope: Scope<'_, PgTransaction>,
        email: &Email,
    ) -> Result<Option<Account>, AppError> {
        let query = || sqlx::query_as::<_, AccountRow>(SELECT_USER_BY_EMAIL).bind(email.as_str());

        let start = Instant::now();
        let result = match scope.into_transaction() {
            Some(tx) => query().fetch_optional(&mut **tx).await,
            None => query().fetch_optional(&self.pool).await,
        };
        metrics::record_db_query("select", "users", start.elapsed().as_secs_f64());

        let row = result.map_err(|e| {
            tracing::error!(error = %e, "Failed to look up user by email");
            AppError::find_user_by_email(e)
        })?;

        Ok(row.map(|r| Account::from(StoredAccount::from(r))))
    }
}
