use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, net::IpAddr, str::FromStr, sync::Arc};
use tokio_postgres::types::ToSql;
use uuid::Uuid;

/// An owned, non-null value extracted from an entity, ready to be laid out
/// for a column's wire type.
#[derive(Debug, Clone)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    UInt(u32),
    Float(f32),
    Double(f64),
    Decimal(Decimal),
    Char(char),
    Text(String),
    Bytes(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampUtc(DateTime<Utc>),
    TimestampOffset(DateTime<FixedOffset>),
    TimeDelta(TimeDelta),
    Interval(Interval),
    Uuid(Uuid),
    Inet(IpAddr),
    Cidr(IpAddr, u8),
    MacAddr(MacAddress),
    Json(serde_json::Value),
    Bits(BitString),
    /// One-dimensional array; `None` elements are SQL NULLs.
    Array(Vec<Option<Value>>),
    /// A value that encodes itself, typically a composite or range type.
    Opaque(Arc<dyn ToSql + Send + Sync>),
}

/// A PostgreSQL `interval` split into the three fields the server stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub microseconds: i64,
}

impl Interval {
    pub fn new(months: i32, days: i32, microseconds: i64) -> Self {
        Self {
            months,
            days,
            microseconds,
        }
    }
}

/// A 6-byte hardware address for `macaddr` columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    pub fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split([':', '-']).collect();
        if parts.len() != 6 {
            return Err(format!("Invalid MAC address: {s}"));
        }
        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts) {
            *octet =
                u8::from_str_radix(part, 16).map_err(|_| format!("Invalid MAC address: {s}"))?;
        }
        Ok(Self(octets))
    }
}

/// Bits for `bit` / `bit varying` columns, most significant first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn new(bits: Vec<bool>) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<bool>> for BitString {
    fn from(bits: Vec<bool>) -> Self {
        Self(bits)
    }
}

impl FromStr for BitString {
    type Err = String;

    /// Parses a string of `0` and `1` characters.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(format!("Invalid bit '{other}' in bit string: {s}")),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// Wraps any value that implements [`ToSql`] so it can be mapped to a column.
///
/// The wrapped value is written as-is with the column's resolved PostgreSQL
/// type; this is how composite and range columns are populated.
#[derive(Debug, Clone)]
pub struct Opaque<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mac_address_parse_and_display() {
        let mac: MacAddress = "08:00:2B:01:02:03".parse().unwrap();
        assert_eq!(mac.octets(), [0x08, 0x00, 0x2b, 0x01, 0x02, 0x03]);
        assert_eq!(mac.to_string(), "08:00:2b:01:02:03");

        let dashed: MacAddress = "08-00-2b-01-02-03".parse().unwrap();
        assert_eq!(dashed, mac);
        assert!("08:00:2b".parse::<MacAddress>().is_err());
    }

    #[test]
    fn test_bit_string_parse() {
        let bits: BitString = "1010".parse().unwrap();
        assert_eq!(bits.bits(), &[true, false, true, false]);
        assert!("10x".parse::<BitString>().is_err());
        assert!("".parse::<BitString>().unwrap().is_empty());
    }
}
