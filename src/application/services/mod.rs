//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **AccountService**: email uniqueness pre-check

pub mod account_service;

pub use account_service::AccountService;
