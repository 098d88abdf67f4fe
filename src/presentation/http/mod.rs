//! HTTP Interface
//!
//! Routes, handlers and the error-to-status translator.

pub mod handlers;
pub mod responses;
pub mod routes;

pub use routes::create_router;
