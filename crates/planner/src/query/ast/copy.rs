//! Defines the AST for SQL COPY statements.

use crate::query::ast::common::TableRef;

/// A binary `COPY ... FROM STDIN` bulk-load statement.
#[derive(Debug, Clone)]
pub struct Copy {
    pub table: TableRef,
    pub columns: Vec<String>,
}
