//! Defines the `Dialect` trait for database-specific SQL syntax.

use model::core::identifier::identifier;

pub trait Dialect: Send + Sync {
    /// Renders an identifier (like a table or column name) the way the
    /// dialect expects it.
    fn quote_identifier(&self, ident: &str) -> String;
}

/// PostgreSQL identifiers.
///
/// With quoting enabled, identifiers that PostgreSQL would otherwise fold to
/// lowercase are wrapped in double quotes; lowercase identifiers are left bare.
/// With quoting disabled, names are emitted exactly as given.
#[derive(Debug, Clone, Default)]
pub struct Postgres {
    pub use_quoting: bool,
}

impl Postgres {
    pub fn new(use_quoting: bool) -> Self {
        Self { use_quoting }
    }
}

impl Dialect for Postgres {
    fn quote_identifier(&self, ident: &str) -> String {
        identifier(ident, self.use_quoting)
    }
}
