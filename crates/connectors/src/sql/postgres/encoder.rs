//! Binary encoding of owned [`Value`]s for a column's wire type.
//!
//! The layout decides the bytes; the PostgreSQL [`Type`] is only consulted for
//! array element OIDs and for opaque values that encode themselves.

use crate::sql::postgres::data_type::{PgWireType, array_member};
use bytes::{BufMut, BytesMut};
use chrono::{NaiveTime, TimeDelta, Utc};
use model::core::{
    value::{BitString, Value},
    wire_type::WireType,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use std::{error::Error, net::IpAddr};
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

type EncodeResult = Result<IsNull, Box<dyn Error + Sync + Send>>;

/// PostgreSQL's address family tags in the inet/cidr binary format.
const PGSQL_AF_INET: u8 = 2;
const PGSQL_AF_INET6: u8 = 3;

/// A value paired with the wire layout it must be written in.
#[derive(Debug)]
pub struct WireValue<'a> {
    pub value: &'a Value,
    pub layout: &'a WireType,
}

impl<'a> WireValue<'a> {
    pub fn new(value: &'a Value, layout: &'a WireType) -> Self {
        Self { value, layout }
    }
}

impl ToSql for WireValue<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> EncodeResult {
        encode(self.value, self.layout, ty, out)
    }

    /// The layout was validated when the column was mapped, so the server's
    /// type is accepted as-is.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn encode(value: &Value, layout: &WireType, ty: &Type, out: &mut BytesMut) -> EncodeResult {
    if let Value::Opaque(inner) = value {
        return inner.to_sql_checked(ty, out);
    }

    match layout {
        WireType::SmallInt => out.put_i16(as_i16(value).ok_or_else(|| mismatch(value, layout))?),
        WireType::Integer => out.put_i32(as_i32(value).ok_or_else(|| mismatch(value, layout))?),
        WireType::BigInt => out.put_i64(as_i64(value).ok_or_else(|| mismatch(value, layout))?),
        WireType::Real => out.put_f32(match value {
            Value::Float(v) => *v,
            other => as_i64(other).ok_or_else(|| mismatch(value, layout))? as f32,
        }),
        WireType::Double => out.put_f64(match value {
            Value::Float(v) => f64::from(*v),
            Value::Double(v) => *v,
            _ => return Err(mismatch(value, layout)),
        }),
        WireType::Numeric => {
            return as_decimal(value)?
                .ok_or_else(|| mismatch(value, layout))?
                .to_sql(ty, out);
        }
        WireType::Money => out.put_i64(money_cents(value)?.ok_or_else(|| mismatch(value, layout))?),
        WireType::Boolean => match value {
            Value::Bool(v) => out.put_u8(u8::from(*v)),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Text | WireType::Varchar | WireType::Char | WireType::Name | WireType::Xml => {
            put_text(value, out).ok_or_else(|| mismatch(value, layout))?
        }
        WireType::Json => put_json(value, out).ok_or_else(|| mismatch(value, layout))?,
        WireType::Jsonb => {
            out.put_u8(1);
            put_json(value, out).ok_or_else(|| mismatch(value, layout))?
        }
        WireType::InternalChar => match value {
            Value::Byte(v) => out.put_u8(*v),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Bytea => match value {
            Value::Bytes(v) => out.put_slice(v),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Date => {
            return match value {
                Value::Date(d) => d.to_sql(ty, out),
                Value::Timestamp(ts) => ts.date().to_sql(ty, out),
                _ => Err(mismatch(value, layout)),
            };
        }
        WireType::Time => out.put_i64(match value {
            Value::Time(t) => time_micros(t)?,
            Value::TimeDelta(d) => delta_micros(d)?,
            _ => return Err(mismatch(value, layout)),
        }),
        WireType::TimeTz => {
            let (micros, offset_west) = match value {
                Value::Time(t) => (time_micros(t)?, 0),
                Value::TimeDelta(d) => (delta_micros(d)?, 0),
                Value::Timestamp(ts) => (time_micros(&ts.time())?, 0),
                Value::TimestampUtc(ts) => (time_micros(&ts.time())?, 0),
                Value::TimestampOffset(ts) => {
                    (time_micros(&ts.time())?, -ts.offset().local_minus_utc())
                }
                _ => return Err(mismatch(value, layout)),
            };
            out.put_i64(micros);
            out.put_i32(offset_west);
        }
        WireType::Timestamp => {
            return match value {
                Value::Date(d) => d.and_time(NaiveTime::MIN).to_sql(ty, out),
                Value::Timestamp(ts) => ts.to_sql(ty, out),
                Value::TimestampUtc(ts) => ts.naive_utc().to_sql(ty, out),
                Value::TimestampOffset(ts) => ts.naive_local().to_sql(ty, out),
                _ => Err(mismatch(value, layout)),
            };
        }
        WireType::TimestampTz => {
            return match value {
                Value::Date(d) => d.and_time(NaiveTime::MIN).and_utc().to_sql(ty, out),
                Value::Timestamp(ts) => ts.and_utc().to_sql(ty, out),
                Value::TimestampUtc(ts) => ts.to_sql(ty, out),
                Value::TimestampOffset(ts) => ts.with_timezone(&Utc).to_sql(ty, out),
                _ => Err(mismatch(value, layout)),
            };
        }
        WireType::Interval => {
            let (micros, days, months) = match value {
                Value::TimeDelta(d) => (delta_micros(d)?, 0, 0),
                Value::Interval(iv) => (iv.microseconds, iv.days, iv.months),
                _ => return Err(mismatch(value, layout)),
            };
            out.put_i64(micros);
            out.put_i32(days);
            out.put_i32(months);
        }
        WireType::Inet => match value {
            Value::Inet(addr) => return addr.to_sql(ty, out),
            Value::Cidr(addr, bits) => put_inet(*addr, Some(*bits), false, out)?,
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Cidr => match value {
            Value::Inet(addr) => put_inet(*addr, None, true, out)?,
            Value::Cidr(addr, bits) => put_inet(*addr, Some(*bits), true, out)?,
            _ => return Err(mismatch(value, layout)),
        },
        WireType::MacAddr => match value {
            Value::MacAddr(mac) => out.put_slice(&mac.octets()),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Uuid => match value {
            Value::Uuid(id) => out.put_slice(id.as_bytes()),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Bit | WireType::Varbit => {
            let bits = match value {
                Value::Bool(v) => BitString::new(vec![*v]),
                Value::Text(s) => s.parse::<BitString>()?,
                Value::Bits(bits) => bits.clone(),
                _ => return Err(mismatch(value, layout)),
            };
            put_bits(&bits, out)?;
        }
        WireType::Oid | WireType::Xid | WireType::Cid => match value {
            Value::UInt(v) => out.put_u32(*v),
            _ => return Err(mismatch(value, layout)),
        },
        WireType::OidVector => match value {
            Value::Array(items) => {
                if items.iter().any(Option::is_none) {
                    return Err("oidvector cannot contain NULL elements".into());
                }
                put_array(items, &WireType::Oid, &Type::OID, 0, out)?;
            }
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Array(element) => match value {
            Value::Array(items) => {
                let member = match array_member(ty) {
                    Some(member) => member.clone(),
                    None => element
                        .pg_type()
                        .ok_or_else(|| format!("No element type known for '{layout}'"))?,
                };
                put_array(items, element, &member, 1, out)?;
            }
            _ => return Err(mismatch(value, layout)),
        },
        WireType::Range(_) | WireType::Composite | WireType::Unknown => {
            return Err(mismatch(value, layout));
        }
    }
    Ok(IsNull::No)
}

fn mismatch(value: &Value, layout: &WireType) -> Box<dyn Error + Sync + Send> {
    format!("Cannot encode {value:?} as PostgreSQL type '{layout}'").into()
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Byte(v) => Some(i64::from(*v)),
        Value::Short(v) => Some(i64::from(*v)),
        Value::Int(v) => Some(i64::from(*v)),
        Value::Long(v) => Some(*v),
        _ => None,
    }
}

fn as_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Long(_) => None,
        other => as_i64(other).and_then(|v| i32::try_from(v).ok()),
    }
}

fn as_i16(value: &Value) -> Option<i16> {
    match value {
        Value::Byte(v) => Some(i16::from(*v)),
        Value::Short(v) => Some(*v),
        _ => None,
    }
}

fn as_decimal(value: &Value) -> Result<Option<Decimal>, Box<dyn Error + Sync + Send>> {
    let decimal = match value {
        Value::Float(v) => Decimal::try_from(*v)?,
        Value::Double(v) => Decimal::try_from(*v)?,
        Value::Decimal(v) => *v,
        other => match as_i64(other) {
            Some(v) => Decimal::from(v),
            None => return Ok(None),
        },
    };
    Ok(Some(decimal))
}

fn money_cents(value: &Value) -> Result<Option<i64>, Box<dyn Error + Sync + Send>> {
    let out_of_range = || format!("Value {value:?} is out of range for type money");
    let cents = match value {
        Value::Float(v) => float_cents(f64::from(*v)).ok_or_else(out_of_range)?,
        Value::Double(v) => float_cents(*v).ok_or_else(out_of_range)?,
        Value::Decimal(v) => v
            .checked_mul(Decimal::ONE_HUNDRED)
            .and_then(|c| c.round().to_i64())
            .ok_or_else(out_of_range)?,
        other => match as_i64(other) {
            Some(v) => v.checked_mul(100).ok_or_else(out_of_range)?,
            None => return Ok(None),
        },
    };
    Ok(Some(cents))
}

fn float_cents(value: f64) -> Option<i64> {
    let cents = (value * 100.0).round();
    (cents.is_finite() && cents >= i64::MIN as f64 && cents < i64::MAX as f64)
        .then_some(cents as i64)
}

fn time_micros(time: &NaiveTime) -> Result<i64, Box<dyn Error + Sync + Send>> {
    delta_micros(&time.signed_duration_since(NaiveTime::MIN))
}

fn delta_micros(delta: &TimeDelta) -> Result<i64, Box<dyn Error + Sync + Send>> {
    delta
        .num_microseconds()
        .ok_or_else(|| "Duration does not fit in 64-bit microseconds".into())
}

fn put_text(value: &Value, out: &mut BytesMut) -> Option<()> {
    match value {
        Value::Text(s) => out.put_slice(s.as_bytes()),
        Value::Char(c) => out.put_slice(c.encode_utf8(&mut [0; 4]).as_bytes()),
        _ => return None,
    }
    Some(())
}

fn put_json(value: &Value, out: &mut BytesMut) -> Option<()> {
    match value {
        Value::Json(json) => out.put_slice(json.to_string().as_bytes()),
        other => put_text(other, out)?,
    }
    Some(())
}

/// Network address layout for `cidr` columns, and for `inet` values that carry
/// their own prefix length.
fn put_inet(
    addr: IpAddr,
    bits: Option<u8>,
    is_cidr: bool,
    out: &mut BytesMut,
) -> Result<(), Box<dyn Error + Sync + Send>> {
    let (family, octets): (u8, Vec<u8>) = match addr {
        IpAddr::V4(v4) => (PGSQL_AF_INET, v4.octets().to_vec()),
        IpAddr::V6(v6) => (PGSQL_AF_INET6, v6.octets().to_vec()),
    };
    let max_bits = (octets.len() * 8) as u8;
    let bits = bits.unwrap_or(max_bits);
    if bits > max_bits {
        return Err(format!("Netmask /{bits} is out of range for {addr}").into());
    }

    out.put_u8(family);
    out.put_u8(bits);
    out.put_u8(u8::from(is_cidr));
    out.put_u8(octets.len() as u8);
    out.put_slice(&octets);
    Ok(())
}

fn put_bits(bits: &BitString, out: &mut BytesMut) -> Result<(), Box<dyn Error + Sync + Send>> {
    let len = i32::try_from(bits.len()).map_err(|_| "Bit string is too long")?;
    out.put_i32(len);
    for chunk in bits.bits().chunks(8) {
        let byte = chunk
            .iter()
            .enumerate()
            .fold(0u8, |acc, (i, bit)| if *bit { acc | (0x80 >> i) } else { acc });
        out.put_u8(byte);
    }
    Ok(())
}

fn put_array(
    items: &[Option<Value>],
    element: &WireType,
    member: &Type,
    lower_bound: i32,
    out: &mut BytesMut,
) -> Result<(), Box<dyn Error + Sync + Send>> {
    let len = i32::try_from(items.len()).map_err(|_| "Array has too many elements")?;
    let has_nulls = items.iter().any(Option::is_none);

    out.put_i32(if items.is_empty() && lower_bound == 1 { 0 } else { 1 });
    out.put_i32(i32::from(has_nulls));
    out.put_u32(member.oid());
    if !(items.is_empty() && lower_bound == 1) {
        out.put_i32(len);
        out.put_i32(lower_bound);
    }

    for item in items {
        let Some(value) = item else {
            out.put_i32(-1);
            continue;
        };
        let start = out.len();
        out.put_i32(0);
        match encode(value, element, member, out)? {
            IsNull::Yes => {
                out.truncate(start);
                out.put_i32(-1);
            }
            IsNull::No => {
                let written = i32::try_from(out.len() - start - 4)
                    .map_err(|_| "Array element is too large")?;
                out[start..start + 4].copy_from_slice(&written.to_be_bytes());
            }
        }
    }
    Ok(())
}
