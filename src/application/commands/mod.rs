//! Application Commands
//!
//! Use cases that change state.

pub mod register_account;

pub use register_account::{RegisterAccount, RegisterAccountCommand};
