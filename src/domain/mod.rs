//! # Domain Layer
//!
//! The domain layer contains the core rules of account registration.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: The `Account` aggregate and its repository trait
//! - **value_objects**: Self-validating value types (Email, Password)
//! - **services**: Ports for credential hashing and identifier generation
//! - **transaction**: Explicit transaction scope and the unit of work
//!
//! ## Design Principles
//!
//! - No dependencies on infrastructure or presentation layers
//! - Repository and unit-of-work traits define data access contracts
//! - Entities encapsulate validation and controlled mutation

pub mod entities;
pub mod services;
pub mod transaction;
pub mod value_objects;

// Re-export commonly used types
pub use entities::*;
pub use services::*;
pub use transaction::{with_transaction, Scope, UnitOfWork};
pub use value_objects::*;
