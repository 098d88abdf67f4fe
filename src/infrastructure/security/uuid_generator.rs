//! Time-ordered UUID public identifiers.

use uuid::Uuid;

use crate::domain::IdGenerator;

/// Generates UUIDv7 strings. Sortable by creation time and safe to expose.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::now_v7().to_string()
    }
}
