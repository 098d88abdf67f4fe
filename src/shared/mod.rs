//! Shared Utilities
//!
//! Common utilities used across all layers.

pub mod context;
pub mod error;
pub mod validation;

pub use context::{CallContext, CancelHandle};
pub use error::{AppError, ErrorCode};
pub use validation::ValidationResult;
