use crate::column::ColumnBinding;
use connectors::{
    channel::BinaryImporter, error::ChannelError, sql::postgres::encoder::WireValue,
};
use futures::{Stream, StreamExt};
use std::{borrow::Borrow, pin::pin};
use tokio_postgres::types::Type;
use tokio_util::sync::CancellationToken;

pub(crate) enum StreamOutcome {
    Finished(u64),
    Cancelled(u64),
}

pub(crate) struct WriteFailure {
    pub row: u64,
    pub column: Option<String>,
    pub source: ChannelError,
}

/// Writes every entity of `rows` as one row, columns in binding order.
///
/// The token is checked before each row and while waiting for the next
/// entity. Rows already written stay in the importer; aborting it is up to
/// the caller.
pub(crate) async fn write_rows<E, I, S>(
    importer: &mut I,
    columns: &[ColumnBinding<E>],
    types: &[Type],
    rows: S,
    cancel: &CancellationToken,
) -> Result<StreamOutcome, WriteFailure>
where
    I: BinaryImporter,
    S: Stream,
    S::Item: Borrow<E>,
{
    let mut rows = pin!(rows);
    let mut written = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Ok(StreamOutcome::Cancelled(written));
        }

        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(StreamOutcome::Cancelled(written)),
            next = rows.next() => next,
        };
        let Some(item) = next else {
            break;
        };

        let entity: &E = item.borrow();
        let row = written + 1;

        importer.start_row().await.map_err(|source| WriteFailure {
            row,
            column: None,
            source,
        })?;

        for (column, ty) in columns.iter().zip(types) {
            let result = match column.extract(entity) {
                None => importer.write_null().await,
                Some(value) => {
                    importer
                        .write(&WireValue::new(&value, column.layout()), ty)
                        .await
                }
            };
            result.map_err(|source| WriteFailure {
                row,
                column: Some(column.column_name().to_string()),
                source,
            })?;
        }

        written = row;
    }

    Ok(StreamOutcome::Finished(written))
}
