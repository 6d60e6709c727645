use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, collections::HashMap, fmt};

/// PostgreSQL binary wire type families a column can be bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Money,
    Boolean,
    /// `character(n)` / `bpchar`.
    Char,
    Varchar,
    Text,
    Name,
    /// The single-byte `"char"` type.
    InternalChar,
    Bytea,
    Date,
    Time,
    TimeTz,
    Timestamp,
    TimestampTz,
    Interval,
    Inet,
    Cidr,
    MacAddr,
    Uuid,
    Json,
    Jsonb,
    Xml,
    Bit,
    Varbit,
    Oid,
    Xid,
    Cid,
    OidVector,
    Array(Box<WireType>),
    Range(RangeType),
    Composite,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RangeType {
    Int4,
    Int8,
    Numeric,
    Timestamp,
    TimestampTz,
    Date,
}

lazy_static! {
    static ref POSTGRES_WIRE_TYPE_MAP: HashMap<&'static str, WireType> =
        build_postgres_wire_type_map();
}

impl WireType {
    pub fn array_of(element: WireType) -> Self {
        WireType::Array(Box::new(element))
    }

    /// Parses a PostgreSQL type name such as `int8`, `character varying(20)` or
    /// `text[]`. Returns `None` for names that are not built-in types.
    pub fn from_postgres_name(type_name: &str) -> Option<Self> {
        let normalized = normalize_type_name(type_name);
        if let Some(element) = normalized.strip_suffix("[]") {
            let element = POSTGRES_WIRE_TYPE_MAP.get(element.trim_end())?;
            return Some(WireType::array_of(element.clone()));
        }
        if let Some(element) = normalized.strip_prefix('_') {
            let element = POSTGRES_WIRE_TYPE_MAP.get(element)?;
            return Some(WireType::array_of(element.clone()));
        }
        POSTGRES_WIRE_TYPE_MAP.get(normalized.as_str()).cloned()
    }

    pub fn postgres_name(&self) -> Cow<'_, str> {
        match self {
            WireType::SmallInt => Cow::Borrowed("smallint"),
            WireType::Integer => Cow::Borrowed("integer"),
            WireType::BigInt => Cow::Borrowed("bigint"),
            WireType::Real => Cow::Borrowed("real"),
            WireType::Double => Cow::Borrowed("double precision"),
            WireType::Numeric => Cow::Borrowed("numeric"),
            WireType::Money => Cow::Borrowed("money"),
            WireType::Boolean => Cow::Borrowed("boolean"),
            WireType::Char => Cow::Borrowed("character"),
            WireType::Varchar => Cow::Borrowed("character varying"),
            WireType::Text => Cow::Borrowed("text"),
            WireType::Name => Cow::Borrowed("name"),
            WireType::InternalChar => Cow::Borrowed("\"char\""),
            WireType::Bytea => Cow::Borrowed("bytea"),
            WireType::Date => Cow::Borrowed("date"),
            WireType::Time => Cow::Borrowed("time without time zone"),
            WireType::TimeTz => Cow::Borrowed("time with time zone"),
            WireType::Timestamp => Cow::Borrowed("timestamp without time zone"),
            WireType::TimestampTz => Cow::Borrowed("timestamp with time zone"),
            WireType::Interval => Cow::Borrowed("interval"),
            WireType::Inet => Cow::Borrowed("inet"),
            WireType::Cidr => Cow::Borrowed("cidr"),
            WireType::MacAddr => Cow::Borrowed("macaddr"),
            WireType::Uuid => Cow::Borrowed("uuid"),
            WireType::Json => Cow::Borrowed("json"),
            WireType::Jsonb => Cow::Borrowed("jsonb"),
            WireType::Xml => Cow::Borrowed("xml"),
            WireType::Bit => Cow::Borrowed("bit"),
            WireType::Varbit => Cow::Borrowed("bit varying"),
            WireType::Oid => Cow::Borrowed("oid"),
            WireType::Xid => Cow::Borrowed("xid"),
            WireType::Cid => Cow::Borrowed("cid"),
            WireType::OidVector => Cow::Borrowed("oidvector"),
            WireType::Array(element) => Cow::Owned(format!("{}[]", element.postgres_name())),
            WireType::Range(range) => Cow::Borrowed(range.postgres_name()),
            WireType::Composite => Cow::Borrowed("composite"),
            WireType::Unknown => Cow::Borrowed("unknown"),
        }
    }
}

impl RangeType {
    pub fn postgres_name(&self) -> &'static str {
        match self {
            RangeType::Int4 => "int4range",
            RangeType::Int8 => "int8range",
            RangeType::Numeric => "numrange",
            RangeType::Timestamp => "tsrange",
            RangeType::TimestampTz => "tstzrange",
            RangeType::Date => "daterange",
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.postgres_name())
    }
}

/// Lowercases, collapses whitespace and drops type modifiers such as `(20)`
/// or `(10,2)`.
fn normalize_type_name(type_name: &str) -> String {
    let mut stripped = String::with_capacity(type_name.len());
    let mut depth = 0usize;
    for ch in type_name.trim().chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            _ if depth == 0 => stripped.push(ch),
            _ => {}
        }
    }
    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .replace(" []", "[]")
}

fn build_postgres_wire_type_map() -> HashMap<&'static str, WireType> {
    use WireType::*;

    let entries = [
        ("smallint", SmallInt),
        ("int2", SmallInt),
        ("integer", Integer),
        ("int", Integer),
        ("int4", Integer),
        ("bigint", BigInt),
        ("int8", BigInt),
        ("real", Real),
        ("float4", Real),
        ("double precision", Double),
        ("float8", Double),
        ("numeric", Numeric),
        ("decimal", Numeric),
        ("money", Money),
        ("boolean", Boolean),
        ("bool", Boolean),
        ("character", Char),
        ("char", Char),
        ("bpchar", Char),
        ("character varying", Varchar),
        ("varchar", Varchar),
        ("text", Text),
        ("name", Name),
        ("\"char\"", InternalChar),
        ("bytea", Bytea),
        ("date", Date),
        ("time", Time),
        ("time without time zone", Time),
        ("timetz", TimeTz),
        ("time with time zone", TimeTz),
        ("timestamp", Timestamp),
        ("timestamp without time zone", Timestamp),
        ("timestamptz", TimestampTz),
        ("timestamp with time zone", TimestampTz),
        ("interval", Interval),
        ("inet", Inet),
        ("cidr", Cidr),
        ("macaddr", MacAddr),
        ("uuid", Uuid),
        ("json", Json),
        ("jsonb", Jsonb),
        ("xml", Xml),
        ("bit", Bit),
        ("bit varying", Varbit),
        ("varbit", Varbit),
        ("oid", Oid),
        ("xid", Xid),
        ("cid", Cid),
        ("oidvector", OidVector),
        ("int4range", Range(RangeType::Int4)),
        ("int8range", Range(RangeType::Int8)),
        ("numrange", Range(RangeType::Numeric)),
        ("tsrange", Range(RangeType::Timestamp)),
        ("tstzrange", Range(RangeType::TimestampTz)),
        ("daterange", Range(RangeType::Date)),
    ];

    let mut map = HashMap::new();
    for (name, wire_type) in entries {
        map.insert(name, wire_type);
    }
    map
}
