//! Infrastructure Layer
//!
//! Contains implementations for external services including:
//! - Database pool, migrations and unit of work (PostgreSQL)
//! - Account repositories (PostgreSQL and in-memory)
//! - Credential hashing and identifier generation
//! - Prometheus metrics

pub mod database;
pub mod metrics;
pub mod repositories;
pub mod security;
