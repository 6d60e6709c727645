#![allow(dead_code)]

use bytes::{BufMut, BytesMut};
use std::error::Error;
use tokio_postgres::{
    Client, Row,
    types::{IsNull, Kind, ToSql, Type, to_sql_checked},
};

/// Composite type used by the composite column scenarios.
pub const PERSON_TYPE_DDL: &str = r#"
    CREATE TYPE {schema}.person_type AS (
        name text,
        age  integer
    );
"#;

pub async fn execute(client: &Client, sql: &str) {
    client.batch_execute(sql).await.expect("execute sql");
}

pub async fn fetch_rows(client: &Client, query: &str) -> Vec<Row> {
    client.query(query, &[]).await.expect("fetch rows")
}

pub async fn get_row_count(client: &Client, table: &str) -> i64 {
    client
        .query_one(&format!("SELECT COUNT(*) FROM {table}"), &[])
        .await
        .expect("count rows")
        .get(0)
}

pub async fn assert_row_count(client: &Client, table: &str, expected: i64) {
    let count = get_row_count(client, table).await;
    assert_eq!(count, expected, "Row count mismatch for table {table}");
}

/// A `person_type` value, written in the composite binary format.
#[derive(Debug, Clone)]
pub struct PersonType {
    pub name: String,
    pub age: i32,
}

impl ToSql for PersonType {
    fn to_sql(&self, _ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        out.put_i32(2);

        out.put_u32(Type::TEXT.oid());
        out.put_i32(i32::try_from(self.name.len())?);
        out.put_slice(self.name.as_bytes());

        out.put_u32(Type::INT4.oid());
        out.put_i32(4);
        out.put_i32(self.age);

        Ok(IsNull::No)
    }

    fn accepts(ty: &Type) -> bool {
        matches!(ty.kind(), Kind::Composite(_)) && ty.name() == "person_type"
    }

    to_sql_checked!();
}
