use crate::core::{value_type::ValueType, wire_type::WireType};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeError {
    #[error("Type '{value_type}' cannot be written as PostgreSQL type '{wire_type}'")]
    Mismatch {
        wire_type: WireType,
        value_type: ValueType,
    },

    #[error("PostgreSQL type '{wire_type}' is not supported here: {reason}")]
    Unsupported { wire_type: WireType, reason: String },

    #[error("Nullable type 'Option<{value_type}>' must be mapped with map_nullable")]
    NullableMapping { value_type: ValueType },
}

/// Checks that a value of `value_type` may be written to a column of
/// `wire_type`. [`WireType::Unknown`] accepts anything.
pub fn validate(wire_type: &WireType, value_type: &ValueType) -> Result<(), TypeError> {
    use ValueType as V;

    let accepted = match wire_type {
        WireType::SmallInt => matches!(value_type, V::Byte | V::Short),
        WireType::Integer => matches!(value_type, V::Byte | V::Short | V::Int),
        WireType::BigInt => matches!(value_type, V::Byte | V::Short | V::Int | V::Long),
        WireType::Real => matches!(
            value_type,
            V::Byte | V::Short | V::Int | V::Long | V::Float
        ),
        WireType::Double => matches!(value_type, V::Float | V::Double),
        WireType::Numeric | WireType::Money => matches!(
            value_type,
            V::Byte | V::Short | V::Int | V::Long | V::Float | V::Double | V::Decimal
        ),
        WireType::Boolean => matches!(value_type, V::Bool),
        WireType::Text | WireType::Varchar | WireType::Name | WireType::Char | WireType::Xml => {
            is_text(value_type)
        }
        WireType::InternalChar => matches!(value_type, V::Byte),
        WireType::Bytea => matches!(value_type, V::Bytes),
        WireType::Date => matches!(value_type, V::Date | V::Timestamp),
        WireType::Time => matches!(value_type, V::Time | V::TimeDelta),
        WireType::TimeTz => matches!(
            value_type,
            V::Time | V::TimeDelta | V::Timestamp | V::TimestampUtc | V::TimestampOffset
        ),
        WireType::Timestamp | WireType::TimestampTz => matches!(
            value_type,
            V::Date | V::Timestamp | V::TimestampUtc | V::TimestampOffset
        ),
        WireType::Interval => matches!(value_type, V::TimeDelta | V::Interval),
        WireType::Inet | WireType::Cidr => matches!(value_type, V::Inet | V::Cidr),
        WireType::MacAddr => matches!(value_type, V::MacAddr),
        WireType::Uuid => matches!(value_type, V::Uuid),
        WireType::Json | WireType::Jsonb => is_text(value_type) || *value_type == V::Json,
        WireType::Bit | WireType::Varbit => matches!(value_type, V::Bool | V::Text | V::Bits),
        WireType::Oid | WireType::Xid | WireType::Cid => matches!(value_type, V::UInt),
        WireType::OidVector => matches!(value_type, V::Array(element) if **element == V::UInt),
        WireType::Array(element) => return validate_array(wire_type, element, value_type),
        WireType::Range(_) => matches!(value_type, V::Opaque(_)),
        WireType::Composite => {
            return Err(TypeError::Unsupported {
                wire_type: wire_type.clone(),
                reason: "composite columns need the type name, use map_type_name".to_string(),
            });
        }
        WireType::Unknown => true,
    };

    if accepted {
        Ok(())
    } else {
        Err(mismatch(wire_type, value_type))
    }
}

fn validate_array(
    wire_type: &WireType,
    element: &WireType,
    value_type: &ValueType,
) -> Result<(), TypeError> {
    match element {
        WireType::Array(_)
        | WireType::Range(_)
        | WireType::Composite
        | WireType::Unknown
        | WireType::OidVector => {
            return Err(TypeError::Unsupported {
                wire_type: wire_type.clone(),
                reason: format!("arrays of '{element}' are not supported"),
            });
        }
        _ => {}
    }

    let ValueType::Array(value_element) = value_type else {
        return Err(mismatch(wire_type, value_type));
    };
    if matches!(**value_element, ValueType::Array(_)) {
        return Err(TypeError::Unsupported {
            wire_type: wire_type.clone(),
            reason: "only one-dimensional arrays are supported".to_string(),
        });
    }

    validate(element, value_element).map_err(|_| mismatch(wire_type, value_type))
}

fn is_text(value_type: &ValueType) -> bool {
    matches!(
        value_type,
        ValueType::Text | ValueType::Char | ValueType::CharArray
    )
}

fn mismatch(wire_type: &WireType, value_type: &ValueType) -> TypeError {
    TypeError::Mismatch {
        wire_type: wire_type.clone(),
        value_type: value_type.clone(),
    }
}
