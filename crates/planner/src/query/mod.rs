use crate::query::ast::common::TableRef;

pub mod ast;
pub mod builder;
pub mod dialect;
pub mod renderer;

/// Builds a table reference, treating an empty or whitespace schema as absent.
pub fn table_ref(schema: &str, name: &str) -> TableRef {
    TableRef {
        schema: Some(schema.to_string()).filter(|s| !s.trim().is_empty()),
        name: name.to_string(),
    }
}
