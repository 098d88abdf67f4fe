//! Account entity and repository trait.
//!
//! Maps to the `users` table in the database schema.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::transaction::Scope;
use crate::domain::value_objects::{Email, Password};
use crate::shared::error::{AppError, ErrorCode};
use crate::shared::validation::{not_blank, ValidationResult, ERR_NOT_BLANK};

/// Account role. Assigned by the service, never by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    /// Parse the database representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Self::User),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted shape of an account, as stored by any repository backend.
///
/// Maps to the `users` table:
/// - id: BIGSERIAL PRIMARY KEY
/// - public_id: VARCHAR(64) NOT NULL UNIQUE
/// - email: VARCHAR(255) NOT NULL, unique while deleted_at IS NULL
/// - password_hash: VARCHAR(255) NOT NULL
/// - name: VARCHAR(100) NOT NULL
/// - role: VARCHAR(20) NOT NULL
/// - created_at / updated_at: TIMESTAMPTZ NOT NULL
/// - deleted_at: TIMESTAMPTZ NULL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    pub id: i64,
    pub public_id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Account aggregate.
///
/// A new account is built from caller input, validated, given a credential
/// hash and then handed to an [`AccountRepository`]. The surrogate `id` and
/// the timestamps only exist once the store has accepted the row.
#[derive(Debug, Clone)]
pub struct Account {
    id: Option<i64>,
    public_id: String,
    email: Email,
    credential: Option<Password>,
    credential_hash: Option<String>,
    name: String,
    role: Option<Role>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Build a not-yet-persisted account from caller input.
    pub fn new(email: &str, password: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            public_id: String::new(),
            email: Email::new(email),
            credential: Some(Password::new(password)),
            credential_hash: None,
            name: name.into(),
            role: None,
            created_at: None,
            updated_at: None,
            deleted_at: None,
        }
    }

    /// Evaluate every entity rule. An empty result means the account is valid.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.assert(not_blank(&self.name), "name", ERR_NOT_BLANK);
        result.assert(self.role.is_some(), "role", ERR_NOT_BLANK);
        result.assert(not_blank(&self.public_id), "public_id", ERR_NOT_BLANK);
        result.merge(self.email.validate());
        result.merge(match &self.credential {
            Some(password) => password.validate(),
            None => Password::validate_raw(""),
        });
        result
    }

    pub fn assign_public_id(&mut self, public_id: impl Into<String>) -> &mut Self {
        self.public_id = public_id.into();
        self
    }

    pub fn assign_role(&mut self, role: Role) -> &mut Self {
        self.role = Some(role);
        self
    }

    /// Hand the plaintext credential over for hashing. Leaves the account
    /// without plaintext.
    pub fn take_credential(&mut self) -> Option<Password> {
        self.credential.take()
    }

    /// Record the one-way credential hash. A hash can be assigned once.
    pub fn assign_credential_hash(&mut self, hash: impl Into<String>) -> Result<(), AppError> {
        if self.credential_hash.is_some() {
            return Err(AppError::new(
                ErrorCode::Internal,
                "credential hash already assigned",
            )
            .with_origin("Account.assign_credential_hash"));
        }
        self.credential = None;
        self.credential_hash = Some(hash.into());
        Ok(())
    }

    /// Merge store-assigned identity and timestamps after insert.
    pub fn mark_persisted(
        &mut self,
        id: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> &mut Self {
        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        self
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn public_id(&self) -> &str {
        &self.public_id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn credential(&self) -> Option<&Password> {
        self.credential.as_ref()
    }

    pub fn credential_hash(&self) -> Option<&str> {
        self.credential_hash.as_deref()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

impl From<StoredAccount> for Account {
    fn from(row: StoredAccount) -> Self {
        Self {
            id: Some(row.id),
            public_id: row.public_id,
            email: Email::new(&row.email),
            credential: None,
            credential_hash: Some(row.password_hash),
            name: row.name,
            role: Role::parse(&row.role),
            created_at: Some(row.created_at),
            updated_at: Some(row.updated_at),
            deleted_at: row.deleted_at,
        }
    }
}

/// Repository trait for account persistence.
///
/// Every call receives an explicit [`Scope`]: implementations run the
/// statement on the scope's transaction when one is present and on a pooled
/// connection otherwise.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Transaction handle type shared with the matching unit of work.
    type Tx: Send + 'static;

    /// Insert a new account. A unique-email violation is `Conflict`; any
    /// other failure is `Internal`. The returned account carries the
    /// store-assigned id and timestamps.
    async fn create_user(
        &self,
        scope: Scope<'_, Self::Tx>,
        account: Account,
    ) -> Result<Account, AppError>;

    /// Find the non-deleted account with this email. `Ok(None)` when there
    /// is none.
    async fn find_user_by_email(
        &self,
        scope: Scope<'_, Self::Tx>,
        email: &Email,
    ) -> Result<Option<Account>, AppError>;
}
