//! Shorthands for mapping a column to one fixed PostgreSQL type.
//!
//! Every mapper accepts an accessor returning either `T` or `Option<T>`, and
//! validates `T` against the target type exactly like
//! [`CopyHelper::map_typed`].

use crate::{column::ColumnSpec, error::CopyError, helper::CopyHelper};
use model::core::{value_type::CopyValue, wire_type::WireType};

macro_rules! wire_mappers {
    ($($(#[$doc:meta])* $name:ident => $wire:expr;)+) => {
        impl<E: 'static> CopyHelper<E> {
            $(
                $(#[$doc])*
                pub fn $name<T, F>(self, column_name: &str, accessor: F) -> Result<Self, CopyError>
                where
                    T: CopyValue,
                    F: Fn(&E) -> T + Send + Sync + 'static,
                {
                    self.push(column_name, ColumnSpec::Wire($wire), accessor)
                }
            )+
        }
    };
}

wire_mappers! {
    map_smallint => WireType::SmallInt;
    map_integer => WireType::Integer;
    map_bigint => WireType::BigInt;
    map_numeric => WireType::Numeric;
    /// Decimal amounts are written as whole cents.
    map_money => WireType::Money;
    map_real => WireType::Real;
    map_double => WireType::Double;
    map_boolean => WireType::Boolean;
    map_text => WireType::Text;
    map_varchar => WireType::Varchar;
    /// `character(n)`; the server pads to the declared length.
    map_char => WireType::Char;
    map_bytea => WireType::Bytea;
    map_date => WireType::Date;
    map_time => WireType::Time;
    /// Time of day with a UTC offset. The offset is taken from a
    /// `DateTime<FixedOffset>`; naive values are written at UTC.
    map_timetz => WireType::TimeTz;
    map_timestamp => WireType::Timestamp;
    map_timestamptz => WireType::TimestampTz;
    map_interval => WireType::Interval;
    map_uuid => WireType::Uuid;
    map_inet => WireType::Inet;
    /// A network with its prefix length, from an `(IpAddr, u8)` pair.
    map_cidr => WireType::Cidr;
    map_macaddr => WireType::MacAddr;
    map_json => WireType::Json;
    map_jsonb => WireType::Jsonb;
    map_xml => WireType::Xml;
    map_bit => WireType::Bit;
    map_varbit => WireType::Varbit;
}

impl<E: 'static> CopyHelper<E> {
    /// Maps a one-dimensional array column with the given element type.
    pub fn map_array<T, F>(
        self,
        column_name: &str,
        accessor: F,
        element: WireType,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.push(column_name, ColumnSpec::Wire(WireType::array_of(element)), accessor)
    }

    /// Maps a composite column. The value must encode itself (see
    /// [`model::core::value::Opaque`]); `type_name` is resolved on the server.
    pub fn map_composite<T, F>(
        self,
        column_name: &str,
        accessor: F,
        type_name: &str,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.map_type_name(column_name, accessor, type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Event, RecordingConnection};
    use chrono::{DateTime, FixedOffset, NaiveDate};
    use model::core::{
        validation::TypeError,
        value::{BitString, Opaque},
    };
    use rust_decimal::Decimal;
    use std::{net::IpAddr, str::FromStr};
    use tokio_postgres::types::{Kind, Type};
    use tokio_util::sync::CancellationToken;

    #[derive(Debug)]
    struct Order {
        id: i32,
        total: Decimal,
        note: Option<String>,
        tags: Vec<String>,
        scores: Vec<Option<i32>>,
        placed: NaiveDate,
        window: DateTime<FixedOffset>,
        host: (IpAddr, u8),
        flags: BitString,
    }

    fn order() -> Order {
        Order {
            id: 42,
            total: Decimal::from_str("12.34").unwrap(),
            note: None,
            tags: vec!["a".to_string(), "b".to_string()],
            scores: vec![Some(1), None],
            placed: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            window: DateTime::parse_from_rfc3339("2024-02-29T09:30:00+02:00").unwrap(),
            host: ("192.168.0.0".parse().unwrap(), 24),
            flags: BitString::from_str("101").unwrap(),
        }
    }

    fn values(events: &[Event]) -> Vec<(Type, Vec<u8>)> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Value { ty, bytes } => Some((ty.clone(), bytes.clone())),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_mappers_fix_the_column_type() {
        let helper = CopyHelper::<Order>::new("orders")
            .map_integer("id", |o: &Order| o.id)
            .unwrap()
            .map_money("total", |o: &Order| o.total)
            .unwrap()
            .map_text("note", |o: &Order| o.note.clone())
            .unwrap()
            .map_date("placed", |o: &Order| o.placed)
            .unwrap()
            .map_timetz("window", |o: &Order| o.window)
            .unwrap()
            .map_cidr("host", |o: &Order| o.host)
            .unwrap()
            .map_varbit("flags", |o: &Order| o.flags.clone())
            .unwrap();

        let conn = RecordingConnection::new();
        helper
            .save_all_async(&conn, [order()], &CancellationToken::new())
            .await
            .unwrap();

        let events = conn.events();
        assert_eq!(events[4], Event::Null);

        let values = values(&events);
        let types: Vec<&Type> = values.iter().map(|(ty, _)| ty).collect();
        assert_eq!(
            types,
            vec![
                &Type::INT4,
                &Type::MONEY,
                &Type::DATE,
                &Type::TIMETZ,
                &Type::CIDR,
                &Type::VARBIT
            ]
        );
        assert_eq!(values[0].1, 42i32.to_be_bytes());
        assert_eq!(values[1].1, 1234i64.to_be_bytes());

        let mut timetz = (((9 * 60 + 30) * 60) as i64 * 1_000_000).to_be_bytes().to_vec();
        timetz.extend_from_slice(&(-7200i32).to_be_bytes());
        assert_eq!(values[3].1, timetz);

        assert_eq!(values[4].1, vec![2, 24, 1, 4, 192, 168, 0, 0]);

        let mut varbit = 3i32.to_be_bytes().to_vec();
        varbit.push(0b1010_0000);
        assert_eq!(values[5].1, varbit);
    }

    #[tokio::test]
    async fn test_array_mappers() {
        let helper = CopyHelper::<Order>::new("orders")
            .map_array("tags", |o: &Order| o.tags.clone(), WireType::Text)
            .unwrap()
            .map_array("scores", |o: &Order| o.scores.clone(), WireType::Integer)
            .unwrap();

        let conn = RecordingConnection::new();
        helper
            .save_all_async(&conn, [order()], &CancellationToken::new())
            .await
            .unwrap();

        let values = values(&conn.events());
        assert_eq!(values[0].0, Type::TEXT_ARRAY);
        assert_eq!(values[1].0, Type::INT4_ARRAY);

        let mut expected = Vec::new();
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&Type::INT4.oid().to_be_bytes());
        expected.extend_from_slice(&2i32.to_be_bytes());
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&4i32.to_be_bytes());
        expected.extend_from_slice(&1i32.to_be_bytes());
        expected.extend_from_slice(&(-1i32).to_be_bytes());
        assert_eq!(values[1].1, expected);
    }

    #[test]
    fn test_mapper_rejects_mismatched_values() {
        let err = CopyHelper::<Order>::new("orders")
            .map_uuid("id", |o: &Order| o.id)
            .unwrap_err();
        assert!(matches!(
            err,
            CopyError::Mapping {
                source: TypeError::Mismatch { .. },
                ..
            }
        ));

        let err = CopyHelper::<Order>::new("orders")
            .map_array("tags", |o: &Order| o.tags.clone(), WireType::OidVector)
            .unwrap_err();
        assert!(matches!(
            err,
            CopyError::Mapping {
                source: TypeError::Unsupported { .. },
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_composite_values_encode_themselves() {
        let person = Type::new(
            "person_type".to_string(),
            90_002,
            Kind::Composite(Vec::new()),
            "sample".to_string(),
        );
        let conn = RecordingConnection::new().with_type("sample.person_type", person.clone());

        let helper = CopyHelper::<Order>::new("orders")
            .map_composite(
                "buyer",
                |o: &Order| Opaque(o.note.clone().unwrap_or_default()),
                "sample.person_type",
            )
            .unwrap();
        assert_eq!(
            helper.target_table().columns[0].data_type_name.as_deref(),
            Some("sample.person_type")
        );

        // An opaque String only accepts text types, so the composite is refused
        // while encoding rather than written with the wrong layout.
        let err = helper
            .save_all_async(&conn, [order()], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CopyError::Protocol(ref protocol) if protocol.column.as_deref() == Some("buyer")
        ));
        assert_eq!(conn.events().last(), Some(&Event::Cancel));
    }

    #[test]
    fn test_composite_needs_a_type_name() {
        let err = CopyHelper::<Order>::new("orders")
            .map_composite("buyer", |o: &Order| Opaque(o.id), "")
            .unwrap_err();
        assert!(matches!(err, CopyError::InvalidArgument(_)));
    }
}
