//! Identifier generation for lists and items.

/// Generate a new opaque unique identifier.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
