//! Credential hashing port.

use crate::shared::error::AppError;

/// One-way credential hashing.
///
/// Implementations are expected to be slow on purpose (tunable work
/// factor) and are called from a blocking thread.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash a plaintext credential. Failures are classified `Internal`.
    fn hash(&self, plaintext: &str) -> Result<String, AppError>;

    /// Check a plaintext credential against a stored hash.
    fn compare(&self, hash: &str, plaintext: &str) -> bool;
}
