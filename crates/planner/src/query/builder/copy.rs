use crate::query::ast::{common::TableRef, copy::Copy};

#[derive(Debug, Clone)]
pub struct CopyBuilder {
    ast: Copy,
}

impl CopyBuilder {
    pub fn new(table: TableRef) -> Self {
        Self {
            ast: Copy {
                table,
                columns: Vec::new(),
            },
        }
    }

    pub fn columns<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        self.ast.columns = columns.iter().map(|s| s.as_ref().to_string()).collect();
        self
    }

    pub fn build(self) -> Copy {
        self.ast
    }
}

#[cfg(test)]
mod tests {
    use crate::query::{builder::copy::CopyBuilder, table_ref};

    #[test]
    fn test_copy_builder_with_columns() {
        let copy = CopyBuilder::new(table_ref("public", "users"))
            .columns(&["id", "name"])
            .build();

        assert_eq!(copy.columns, vec!["id", "name"]);
        assert_eq!(copy.table.schema.as_deref(), Some("public"));
    }

    #[test]
    fn test_blank_schema_is_dropped() {
        let copy = CopyBuilder::new(table_ref("  ", "users")).build();
        assert!(copy.table.schema.is_none());
        assert!(copy.columns.is_empty());
    }
}
