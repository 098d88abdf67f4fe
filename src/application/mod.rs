//! Application Layer
//!
//! Contains the registration use case, its supporting services and the
//! data transfer objects (DTOs). This layer orchestrates the flow of data
//! between the presentation and domain layers.

pub mod commands;
pub mod dto;
pub mod services;
