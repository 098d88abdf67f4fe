//! # Domain Value Objects
//!
//! Immutable, self-validating value types.
//!
//! ## Value Objects
//!
//! - **Email**: normalized account email address
//! - **Password**: transient plaintext credential with strength rules

mod email;
mod password;

pub use email::*;
pub use password::*;
