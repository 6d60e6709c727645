use model::core::wire_type::{RangeType, WireType};
use tokio_postgres::types::{Kind, Type};

pub trait PgWireType {
    /// The statically known PostgreSQL type, or `None` when the type has no
    /// fixed OID and must be resolved on the server.
    fn pg_type(&self) -> Option<Type>;
}

impl PgWireType for WireType {
    fn pg_type(&self) -> Option<Type> {
        let ty = match self {
            WireType::SmallInt => Type::INT2,
            WireType::Integer => Type::INT4,
            WireType::BigInt => Type::INT8,
            WireType::Real => Type::FLOAT4,
            WireType::Double => Type::FLOAT8,
            WireType::Numeric => Type::NUMERIC,
            WireType::Money => Type::MONEY,
            WireType::Boolean => Type::BOOL,
            WireType::Char => Type::BPCHAR,
            WireType::Varchar => Type::VARCHAR,
            WireType::Text => Type::TEXT,
            WireType::Name => Type::NAME,
            WireType::InternalChar => Type::CHAR,
            WireType::Bytea => Type::BYTEA,
            WireType::Date => Type::DATE,
            WireType::Time => Type::TIME,
            WireType::TimeTz => Type::TIMETZ,
            WireType::Timestamp => Type::TIMESTAMP,
            WireType::TimestampTz => Type::TIMESTAMPTZ,
            WireType::Interval => Type::INTERVAL,
            WireType::Inet => Type::INET,
            WireType::Cidr => Type::CIDR,
            WireType::MacAddr => Type::MACADDR,
            WireType::Uuid => Type::UUID,
            WireType::Json => Type::JSON,
            WireType::Jsonb => Type::JSONB,
            WireType::Xml => Type::XML,
            WireType::Bit => Type::BIT,
            WireType::Varbit => Type::VARBIT,
            WireType::Oid => Type::OID,
            WireType::Xid => Type::XID,
            WireType::Cid => Type::CID,
            WireType::OidVector => Type::OID_VECTOR,
            WireType::Array(element) => return array_type(element),
            WireType::Range(range) => match range {
                RangeType::Int4 => Type::INT4_RANGE,
                RangeType::Int8 => Type::INT8_RANGE,
                RangeType::Numeric => Type::NUM_RANGE,
                RangeType::Timestamp => Type::TS_RANGE,
                RangeType::TimestampTz => Type::TSTZ_RANGE,
                RangeType::Date => Type::DATE_RANGE,
            },
            WireType::Composite | WireType::Unknown => return None,
        };
        Some(ty)
    }
}

fn array_type(element: &WireType) -> Option<Type> {
    let ty = match element {
        WireType::SmallInt => Type::INT2_ARRAY,
        WireType::Integer => Type::INT4_ARRAY,
        WireType::BigInt => Type::INT8_ARRAY,
        WireType::Real => Type::FLOAT4_ARRAY,
        WireType::Double => Type::FLOAT8_ARRAY,
        WireType::Numeric => Type::NUMERIC_ARRAY,
        WireType::Money => Type::MONEY_ARRAY,
        WireType::Boolean => Type::BOOL_ARRAY,
        WireType::Char => Type::BPCHAR_ARRAY,
        WireType::Varchar => Type::VARCHAR_ARRAY,
        WireType::Text => Type::TEXT_ARRAY,
        WireType::Name => Type::NAME_ARRAY,
        WireType::InternalChar => Type::CHAR_ARRAY,
        WireType::Bytea => Type::BYTEA_ARRAY,
        WireType::Date => Type::DATE_ARRAY,
        WireType::Time => Type::TIME_ARRAY,
        WireType::TimeTz => Type::TIMETZ_ARRAY,
        WireType::Timestamp => Type::TIMESTAMP_ARRAY,
        WireType::TimestampTz => Type::TIMESTAMPTZ_ARRAY,
        WireType::Interval => Type::INTERVAL_ARRAY,
        WireType::Inet => Type::INET_ARRAY,
        WireType::Cidr => Type::CIDR_ARRAY,
        WireType::MacAddr => Type::MACADDR_ARRAY,
        WireType::Uuid => Type::UUID_ARRAY,
        WireType::Json => Type::JSON_ARRAY,
        WireType::Jsonb => Type::JSONB_ARRAY,
        WireType::Xml => Type::XML_ARRAY,
        WireType::Bit => Type::BIT_ARRAY,
        WireType::Varbit => Type::VARBIT_ARRAY,
        WireType::Oid => Type::OID_ARRAY,
        WireType::Xid => Type::XID_ARRAY,
        WireType::Cid => Type::CID_ARRAY,
        WireType::OidVector
        | WireType::Array(_)
        | WireType::Range(_)
        | WireType::Composite
        | WireType::Unknown => return None,
    };
    Some(ty)
}

/// The element type of an array type, if `ty` is one.
pub fn array_member(ty: &Type) -> Option<&Type> {
    match ty.kind() {
        Kind::Array(member) => Some(member),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_types() {
        assert_eq!(WireType::SmallInt.pg_type(), Some(Type::INT2));
        assert_eq!(WireType::InternalChar.pg_type(), Some(Type::CHAR));
        assert_eq!(WireType::Char.pg_type(), Some(Type::BPCHAR));
        assert_eq!(
            WireType::Range(RangeType::TimestampTz).pg_type(),
            Some(Type::TSTZ_RANGE)
        );
        assert_eq!(WireType::Composite.pg_type(), None);
        assert_eq!(WireType::Unknown.pg_type(), None);
    }

    #[test]
    fn test_array_types_carry_their_member() {
        let ty = WireType::array_of(WireType::Text).pg_type().unwrap();
        assert_eq!(ty, Type::TEXT_ARRAY);
        assert_eq!(array_member(&ty), Some(&Type::TEXT));
        assert_eq!(array_member(&Type::TEXT), None);
        assert_eq!(WireType::array_of(WireType::Unknown).pg_type(), None);
    }
}
