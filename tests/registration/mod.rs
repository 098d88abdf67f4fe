//! Registration workflow tests below the HTTP layer.

mod concurrency_tests;
mod postgres_tests;
