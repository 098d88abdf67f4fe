//! Response DTOs
//!
//! Data structures for API response bodies.

use serde::{Deserialize, Serialize};

use crate::domain::Account;

/// Timestamp layout used in responses (microsecond precision, UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Public projection of a newly registered account. Never carries the
/// credential hash or the internal id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredAccount {
    pub public_id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: String,
}

impl From<&Account> for RegisteredAccount {
    fn from(account: &Account) -> Self {
        Self {
            public_id: account.public_id().to_owned(),
            name: account.name().to_owned(),
            email: account.email().as_str().to_owned(),
            role: account.role().unwrap_or_default().to_string(),
            created_at: account
                .created_at()
                .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }
}
