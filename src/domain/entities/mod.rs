//! # Domain Entities
//!
//! Aggregates with identity, plus the repository traits that persist them.

mod account;

pub use account::*;
