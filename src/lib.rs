//! # Identity Service Library
//!
//! The registration path of an identity service:
//! - validation of new-account requests
//! - race-safe email uniqueness (optimistic pre-check plus the store's
//!   unique constraint)
//! - Argon2id credential hashing
//! - transactional persistence through an explicit unit of work
//! - a classified error model translated to HTTP at the edge
//!
//! ## Architecture
//!
//! The crate follows Clean Architecture principles:
//!
//! - **Domain Layer**: Account aggregate, value objects, ports and the transaction scope
//! - **Application Layer**: Registration command, uniqueness guard and DTOs
//! - **Infrastructure Layer**: PostgreSQL and in-memory stores, hashing, metrics
//! - **Presentation Layer**: HTTP routes and handlers
//!
//! ## Module Structure
//!
//! ```text
//! identity_service/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, ports, unit of work
//! +-- application/    Registration command, services and DTOs
//! +-- infrastructure/ Database, repositories, security, metrics
//! +-- presentation/   HTTP routes and middleware
//! +-- shared/         Errors, validation results, call context
//! ```

// Configuration module
pub mod config;

// Domain layer - Core business logic
pub mod domain;

// Application layer - Use cases
pub mod application;

// Infrastructure layer - External implementations
pub mod infrastructure;

// Presentation layer - HTTP handlers
pub mod presentation;

// Shared utilities
pub mod shared;

// Application startup and state management
pub mod startup;

// Telemetry and observability
pub mod telemetry;
