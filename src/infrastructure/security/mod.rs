//! Security Module
//!
//! Credential hashing and public identifier generation.

pub mod argon2_hasher;
pub mod uuid_generator;

pub use argon2_hasher::Argon2CredentialHasher;
pub use uuid_generator::UuidGenerator;
