use connectors::sql::postgres::data_type::PgWireType;
use model::core::{
    table::TargetColumn,
    validation::{TypeError, validate},
    value::Value,
    value_type::{CopyValue, ValueType},
    wire_type::WireType,
};
use std::{fmt, sync::Arc};
use tokio_postgres::types::Type;

type Extractor<E> = Arc<dyn Fn(&E) -> Option<Value> + Send + Sync>;

/// How the PostgreSQL type of a column is chosen.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnSpec {
    /// Derived from the Rust type of the accessor.
    Inferred,
    Wire(WireType),
    /// A PostgreSQL type name; custom names are resolved on the server.
    TypeName(String),
}

/// One mapped column: its name, how values are extracted from an entity and
/// how they are laid out on the wire.
pub struct ColumnBinding<E> {
    column_name: String,
    value_type: ValueType,
    spec: ColumnSpec,
    layout: WireType,
    pg_type: Option<Type>,
    extract: Extractor<E>,
}

impl<E: 'static> ColumnBinding<E> {
    /// Validates the accessor's value type against `spec` and builds the
    /// binding. Nullability is checked by the caller.
    pub fn new<T, F>(column_name: &str, spec: ColumnSpec, accessor: F) -> Result<Self, TypeError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        let value_type = T::value_type();
        let (layout, pg_type) = resolve_layout(&value_type, &spec)?;

        Ok(Self {
            column_name: column_name.to_string(),
            value_type,
            spec,
            layout,
            pg_type,
            extract: Arc::new(move |entity: &E| accessor(entity).into_value()),
        })
    }
}

impl<E> ColumnBinding<E> {
    pub fn column_name(&self) -> &str {
        &self.column_name
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn spec(&self) -> &ColumnSpec {
        &self.spec
    }

    /// The wire family used to lay out the bytes of each value.
    pub fn layout(&self) -> &WireType {
        &self.layout
    }

    /// The statically known PostgreSQL type, `None` if it must be resolved.
    pub fn pg_type(&self) -> Option<&Type> {
        self.pg_type.as_ref()
    }

    /// The type name to look up on the server when there is no static type.
    pub fn unresolved_type_name(&self) -> Option<&str> {
        match (&self.pg_type, &self.spec) {
            (None, ColumnSpec::TypeName(name)) => Some(name),
            _ => None,
        }
    }

    pub fn extract(&self, entity: &E) -> Option<Value> {
        (self.extract)(entity)
    }

    pub fn target_column(&self) -> TargetColumn {
        let (wire_type, data_type_name) = match &self.spec {
            ColumnSpec::Inferred => (None, None),
            ColumnSpec::Wire(wire_type) => (Some(wire_type.clone()), None),
            ColumnSpec::TypeName(name) => (None, Some(name.clone())),
        };
        TargetColumn {
            column_name: self.column_name.clone(),
            value_type: self.value_type.clone(),
            wire_type,
            data_type_name,
        }
    }
}

impl<E> Clone for ColumnBinding<E> {
    fn clone(&self) -> Self {
        Self {
            column_name: self.column_name.clone(),
            value_type: self.value_type.clone(),
            spec: self.spec.clone(),
            layout: self.layout.clone(),
            pg_type: self.pg_type.clone(),
            extract: Arc::clone(&self.extract),
        }
    }
}

impl<E> fmt::Debug for ColumnBinding<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("column_name", &self.column_name)
            .field("value_type", &self.value_type)
            .field("spec", &self.spec)
            .field("layout", &self.layout)
            .field("pg_type", &self.pg_type)
            .finish_non_exhaustive()
    }
}

fn resolve_layout(
    value_type: &ValueType,
    spec: &ColumnSpec,
) -> Result<(WireType, Option<Type>), TypeError> {
    match spec {
        ColumnSpec::Inferred | ColumnSpec::Wire(WireType::Unknown) => {
            let layout = value_type
                .default_wire_type()
                .ok_or_else(|| TypeError::Unsupported {
                    wire_type: WireType::Unknown,
                    reason: format!("values of type '{value_type}' need a PostgreSQL type name"),
                })?;
            validate(&layout, value_type)?;
            let pg_type = static_type(&layout)?;
            Ok((layout, Some(pg_type)))
        }
        ColumnSpec::Wire(wire_type) => {
            validate(wire_type, value_type)?;
            let pg_type = static_type(wire_type)?;
            Ok((wire_type.clone(), Some(pg_type)))
        }
        ColumnSpec::TypeName(name) => match WireType::from_postgres_name(name) {
            Some(wire_type) => {
                validate(&wire_type, value_type)?;
                let pg_type = wire_type.pg_type();
                Ok((wire_type, pg_type))
            }
            None => {
                let layout = value_type.default_wire_type().unwrap_or(WireType::Unknown);
                Ok((layout, None))
            }
        },
    }
}

fn static_type(wire_type: &WireType) -> Result<Type, TypeError> {
    wire_type.pg_type().ok_or_else(|| TypeError::Unsupported {
        wire_type: wire_type.clone(),
        reason: "the type has no fixed OID, use map_type_name".to_string(),
    })
}
