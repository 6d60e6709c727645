use crate::core::{identifier::identifier, value_type::ValueType, wire_type::WireType};
use serde::Serialize;

/// Schema and table name of a COPY target, plus the quoting policy used when
/// rendering them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    schema_name: String,
    table_name: String,
    use_quoting: bool,
}

impl TableDescriptor {
    pub fn new(schema_name: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            schema_name: schema_name.into(),
            table_name: table_name.into(),
            use_quoting: false,
        }
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn use_quoting(&self) -> bool {
        self.use_quoting
    }

    pub fn set_quoting(&mut self, enabled: bool) {
        self.use_quoting = enabled;
    }

    /// The schema name, or `None` when it is empty or whitespace.
    pub fn schema(&self) -> Option<&str> {
        Some(self.schema_name.as_str()).filter(|s| !s.trim().is_empty())
    }

    pub fn fully_qualified_name(&self) -> String {
        qualified_name(self.schema(), &self.table_name, self.use_quoting)
    }
}

/// Read-only snapshot of a helper's target: table identity plus the columns in
/// registration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetTable {
    pub schema_name: String,
    pub table_name: String,
    pub use_quoting: bool,
    pub columns: Vec<TargetColumn>,
}

impl TargetTable {
    pub fn fully_qualified_name(&self) -> String {
        let schema = Some(self.schema_name.as_str()).filter(|s| !s.trim().is_empty());
        qualified_name(schema, &self.table_name, self.use_quoting)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetColumn {
    pub column_name: String,
    pub value_type: ValueType,
    pub wire_type: Option<WireType>,
    pub data_type_name: Option<String>,
}

fn qualified_name(schema: Option<&str>, table: &str, use_quoting: bool) -> String {
    match schema {
        Some(schema) => format!(
            "{}.{}",
            identifier(schema, use_quoting),
            identifier(table, use_quoting)
        ),
        None => identifier(table, use_quoting),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_without_schema() {
        let table = TableDescriptor::new("", "users");
        assert_eq!(table.fully_qualified_name(), "users");

        let table = TableDescriptor::new("   ", "users");
        assert_eq!(table.fully_qualified_name(), "users");
    }

    #[test]
    fn test_schema_qualified_name() {
        let table = TableDescriptor::new("sample", "unit_test");
        assert_eq!(table.fully_qualified_name(), "sample.unit_test");
    }

    #[test]
    fn test_quoting_enabled_quotes_mixed_case() {
        let mut table = TableDescriptor::new("Sample", "TestUsers");
        table.set_quoting(true);
        assert_eq!(table.fully_qualified_name(), r#""Sample"."TestUsers""#);

        let mut table = TableDescriptor::new("sample", "TestUsers");
        table.set_quoting(true);
        assert_eq!(table.fully_qualified_name(), r#"sample."TestUsers""#);
    }

    #[test]
    fn test_quoting_disabled_never_adds_quotes() {
        let table = TableDescriptor::new("Sample", "TestUsers");
        assert_eq!(table.fully_qualified_name(), "Sample.TestUsers");
    }

    #[test]
    fn test_target_table_matches_descriptor() {
        let target = TargetTable {
            schema_name: "sample".into(),
            table_name: "MixedCase".into(),
            use_quoting: true,
            columns: Vec::new(),
        };
        assert_eq!(target.fully_qualified_name(), r#"sample."MixedCase""#);
    }
}
