use crate::core::{
    value::{BitString, Interval, MacAddress, Opaque, Value},
    wire_type::WireType,
};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::{fmt, net::IpAddr, sync::Arc};
use tokio_postgres::types::ToSql;
use uuid::Uuid;

/// The Rust source type an accessor produces, as seen by the validation engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum ValueType {
    Bool,
    Byte,
    Short,
    Int,
    Long,
    UInt,
    Float,
    Double,
    Decimal,
    Char,
    CharArray,
    Text,
    Bytes,
    Date,
    Time,
    Timestamp,
    TimestampUtc,
    TimestampOffset,
    TimeDelta,
    Interval,
    Uuid,
    Inet,
    Cidr,
    MacAddr,
    Json,
    Bits,
    Array(Box<ValueType>),
    Opaque(&'static str),
}

impl ValueType {
    /// The wire type used when a column is mapped without an explicit one.
    /// Opaque values have no default and need a data type name.
    pub fn default_wire_type(&self) -> Option<WireType> {
        let wire_type = match self {
            ValueType::Bool => WireType::Boolean,
            ValueType::Byte | ValueType::Short => WireType::SmallInt,
            ValueType::Int => WireType::Integer,
            ValueType::Long => WireType::BigInt,
            ValueType::UInt => WireType::Oid,
            ValueType::Float => WireType::Real,
            ValueType::Double => WireType::Double,
            ValueType::Decimal => WireType::Numeric,
            ValueType::Char | ValueType::CharArray | ValueType::Text => WireType::Text,
            ValueType::Bytes => WireType::Bytea,
            ValueType::Date => WireType::Date,
            ValueType::Time => WireType::Time,
            ValueType::Timestamp => WireType::Timestamp,
            ValueType::TimestampUtc | ValueType::TimestampOffset => WireType::TimestampTz,
            ValueType::TimeDelta | ValueType::Interval => WireType::Interval,
            ValueType::Uuid => WireType::Uuid,
            ValueType::Inet => WireType::Inet,
            ValueType::Cidr => WireType::Cidr,
            ValueType::MacAddr => WireType::MacAddr,
            ValueType::Json => WireType::Jsonb,
            ValueType::Bits => WireType::Varbit,
            ValueType::Array(element) => WireType::array_of(element.default_wire_type()?),
            ValueType::Opaque(_) => return None,
        };
        Some(wire_type)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Bool => f.write_str("bool"),
            ValueType::Byte => f.write_str("u8"),
            ValueType::Short => f.write_str("i16"),
            ValueType::Int => f.write_str("i32"),
            ValueType::Long => f.write_str("i64"),
            ValueType::UInt => f.write_str("u32"),
            ValueType::Float => f.write_str("f32"),
            ValueType::Double => f.write_str("f64"),
            ValueType::Decimal => f.write_str("Decimal"),
            ValueType::Char => f.write_str("char"),
            ValueType::CharArray => f.write_str("Vec<char>"),
            ValueType::Text => f.write_str("String"),
            ValueType::Bytes => f.write_str("Vec<u8>"),
            ValueType::Date => f.write_str("NaiveDate"),
            ValueType::Time => f.write_str("NaiveTime"),
            ValueType::Timestamp => f.write_str("NaiveDateTime"),
            ValueType::TimestampUtc => f.write_str("DateTime<Utc>"),
            ValueType::TimestampOffset => f.write_str("DateTime<FixedOffset>"),
            ValueType::TimeDelta => f.write_str("TimeDelta"),
            ValueType::Interval => f.write_str("Interval"),
            ValueType::Uuid => f.write_str("Uuid"),
            ValueType::Inet => f.write_str("IpAddr"),
            ValueType::Cidr => f.write_str("(IpAddr, u8)"),
            ValueType::MacAddr => f.write_str("MacAddress"),
            ValueType::Json => f.write_str("serde_json::Value"),
            ValueType::Bits => f.write_str("BitString"),
            ValueType::Array(element) => write!(f, "Vec<{element}>"),
            ValueType::Opaque(name) => f.write_str(name),
        }
    }
}

/// A Rust type an accessor may return for a mapped column.
///
/// `Option<T>` is the nullable form of `T`: `None` is written as SQL NULL.
pub trait CopyValue: Send + 'static {
    fn value_type() -> ValueType;

    /// Converts into an owned [`Value`], or `None` for a SQL NULL.
    fn into_value(self) -> Option<Value>;

    fn is_nullable() -> bool {
        false
    }
}

/// Types that may appear as elements of a `Vec<T>` array column.
pub trait ArrayElement: CopyValue {}

impl<T: CopyValue> CopyValue for Option<T> {
    fn value_type() -> ValueType {
        T::value_type()
    }

    fn into_value(self) -> Option<Value> {
        self.and_then(CopyValue::into_value)
    }

    fn is_nullable() -> bool {
        true
    }
}

impl<T: ArrayElement> ArrayElement for Option<T> {}

impl<T: ArrayElement> CopyValue for Vec<T> {
    fn value_type() -> ValueType {
        ValueType::Array(Box::new(T::value_type()))
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Array(
            self.into_iter().map(CopyValue::into_value).collect(),
        ))
    }
}

impl CopyValue for Vec<u8> {
    fn value_type() -> ValueType {
        ValueType::Bytes
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Bytes(self))
    }
}

impl CopyValue for Vec<char> {
    fn value_type() -> ValueType {
        ValueType::CharArray
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Text(self.into_iter().collect()))
    }
}

impl CopyValue for &'static str {
    fn value_type() -> ValueType {
        ValueType::Text
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Text(self.to_string()))
    }
}

impl CopyValue for (IpAddr, u8) {
    fn value_type() -> ValueType {
        ValueType::Cidr
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Cidr(self.0, self.1))
    }
}

impl<T> CopyValue for Opaque<T>
where
    T: ToSql + Send + Sync + 'static,
{
    fn value_type() -> ValueType {
        ValueType::Opaque(std::any::type_name::<T>())
    }

    fn into_value(self) -> Option<Value> {
        Some(Value::Opaque(Arc::new(self.0)))
    }
}

macro_rules! copy_value {
    ($($ty:ty => $tag:ident),* $(,)?) => {
        $(
            impl CopyValue for $ty {
                fn value_type() -> ValueType {
                    ValueType::$tag
                }

                fn into_value(self) -> Option<Value> {
                    Some(Value::$tag(self))
                }
            }
        )*
    };
}

copy_value! {
    bool => Bool,
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    u32 => UInt,
    f32 => Float,
    f64 => Double,
    Decimal => Decimal,
    char => Char,
    String => Text,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => Timestamp,
    DateTime<Utc> => TimestampUtc,
    DateTime<FixedOffset> => TimestampOffset,
    TimeDelta => TimeDelta,
    Interval => Interval,
    Uuid => Uuid,
    IpAddr => Inet,
    MacAddress => MacAddr,
    serde_json::Value => Json,
    BitString => Bits,
}

macro_rules! array_element {
    ($($ty:ty),* $(,)?) => {
        $(impl ArrayElement for $ty {})*
    };
}

array_element! {
    bool, i16, i32, i64, u32, f32, f64, Decimal, String, Vec<u8>,
    NaiveDate, NaiveTime, NaiveDateTime, DateTime<Utc>, DateTime<FixedOffset>,
    TimeDelta, Interval, Uuid, IpAddr, MacAddress, serde_json::Value, BitString,
}
