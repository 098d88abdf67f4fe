//! Repository Implementations
//!
//! Implementations of the domain account repository and unit of work.
//!
//! ## Available Backends
//!
//! - **PgAccountRepository** - PostgreSQL, paired with `PgUnitOfWork`
//! - **InMemoryAccountStore** - process-local store implementing both traits
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use sqlx::PgPool;
//! use crate::infrastructure::database::PgUnitOfWork;
//! use crate::infrastructure::repositories::PgAccountRepository;
//!
//! fn setup(pool: PgPool) {
//!     let uow = PgUnitOfWork::new(pool.clone());
//!     let accounts = PgAccountRepository::new(pool);
//! }
//! ```

pub mod account_repository;
pub mod memory_account_repository;

pub use account_repository::PgAccountRepository;
pub use memory_account_repository::{InMemoryAccountStore, MemoryStoreError, MemoryTransaction};
