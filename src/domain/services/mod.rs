//! # Domain Services
//!
//! Ports for collaborators the registration workflow depends on but does
//! not implement itself.
//!
//! ## Services
//!
//! - **CredentialHasher**: one-way, deliberately slow credential hashing
//! - **IdGenerator**: globally unique public identifiers

mod credential_hasher;
mod id_generator;

pub use credential_hasher::*;
pub use id_generator::*;
