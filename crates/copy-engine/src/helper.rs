//! The copy helper: a reusable, typed description of a COPY target that
//! streams entities into PostgreSQL with `COPY ... FROM STDIN BINARY`.

use crate::{
    column::{ColumnBinding, ColumnSpec},
    error::{CopyError, CopyPhase, ProtocolError},
    stream::{StreamOutcome, WriteFailure, write_rows},
};
use connectors::{
    channel::{BinaryImporter, BulkImportConnection},
    error::ChannelError,
    settings::ImportSettings,
};
use futures::{Stream, executor::block_on, stream};
use model::core::{
    table::{TableDescriptor, TargetTable},
    validation::TypeError,
    value_type::CopyValue,
    wire_type::WireType,
};
use planner::query::{builder::copy::CopyBuilder, dialect::Postgres, renderer::render_sql, table_ref};
use std::{borrow::Borrow, collections::HashMap, fmt};
use tokio_postgres::types::Type;
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Maps the fields of `E` to the columns of one table.
///
/// Columns are registered with chained `map*` calls, in the order they are
/// written. The helper holds configuration only and can be reused for any
/// number of saves, on any connection. Concurrent saves must not share a
/// connection: one COPY runs per connection at a time.
///
/// ```ignore
/// let helper = CopyHelper::<Person>::with_schema("sample", "people")
///     .map_bigint("id", |p| p.id)?
///     .map_text("name", |p| p.name.clone())?
///     .map_nullable("nickname", |p| p.nickname.clone(), WireType::Varchar)?;
///
/// let rows = helper.save_all_async(&client, &people, &CancellationToken::new()).await?;
/// ```
pub struct CopyHelper<E> {
    table: TableDescriptor,
    columns: Vec<ColumnBinding<E>>,
    settings: ImportSettings,
}

impl<E> Clone for CopyHelper<E> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            columns: self.columns.clone(),
            settings: self.settings.clone(),
        }
    }
}

impl<E> fmt::Debug for CopyHelper<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CopyHelper")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("settings", &self.settings)
            .finish()
    }
}

impl<E: 'static> CopyHelper<E> {
    pub fn new(table_name: &str) -> Self {
        Self::with_schema("", table_name)
    }

    pub fn with_schema(schema_name: &str, table_name: &str) -> Self {
        Self {
            table: TableDescriptor::new(schema_name, table_name),
            columns: Vec::new(),
            settings: ImportSettings::default(),
        }
    }

    /// Quotes schema, table and column names that PostgreSQL would otherwise
    /// fold to lowercase.
    pub fn use_quoting(mut self, enabled: bool) -> Self {
        self.table.set_quoting(enabled);
        self
    }

    pub fn with_settings(mut self, settings: ImportSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Maps a column whose PostgreSQL type is inferred from `T`.
    pub fn map<T, F>(self, column_name: &str, accessor: F) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.map_strict(column_name, ColumnSpec::Inferred, accessor)
    }

    pub fn map_typed<T, F>(
        self,
        column_name: &str,
        accessor: F,
        wire_type: WireType,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        self.map_strict(column_name, ColumnSpec::Wire(wire_type), accessor)
    }

    /// Maps a column by PostgreSQL type name. Built-in names such as `int8` or
    /// `character varying(20)` are validated against `T`; other names (enums,
    /// composites, domains) are looked up on the connection when saving.
    ///
    /// The accessor may return `T` or `Option<T>`.
    pub fn map_type_name<T, F>(
        self,
        column_name: &str,
        accessor: F,
        data_type_name: &str,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        if data_type_name.trim().is_empty() {
            return Err(CopyError::InvalidArgument(format!(
                "Data type name for column '{column_name}' must not be empty"
            )));
        }
        self.push(
            column_name,
            ColumnSpec::TypeName(data_type_name.trim().to_string()),
            accessor,
        )
    }

    /// Maps a column whose accessor returns `Option<T>`; `None` is written as NULL.
    pub fn map_nullable<T, F>(
        self,
        column_name: &str,
        accessor: F,
        wire_type: WireType,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> Option<T> + Send + Sync + 'static,
    {
        self.push(column_name, ColumnSpec::Wire(wire_type), accessor)
    }

    /// Rejects `Option<T>` accessors, which must go through [`Self::map_nullable`].
    fn map_strict<T, F>(self, column_name: &str, spec: ColumnSpec, accessor: F) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        if T::is_nullable() {
            return Err(CopyError::Mapping {
                column: column_name.to_string(),
                source: TypeError::NullableMapping {
                    value_type: T::value_type(),
                },
            });
        }
        self.push(column_name, spec, accessor)
    }

    pub(crate) fn push<T, F>(
        mut self,
        column_name: &str,
        spec: ColumnSpec,
        accessor: F,
    ) -> Result<Self, CopyError>
    where
        T: CopyValue,
        F: Fn(&E) -> T + Send + Sync + 'static,
    {
        let binding =
            ColumnBinding::new(column_name, spec, accessor).map_err(|source| CopyError::Mapping {
                column: column_name.to_string(),
                source,
            })?;
        self.columns.push(binding);
        Ok(self)
    }
}

impl<E> CopyHelper<E> {
    pub fn columns(&self) -> &[ColumnBinding<E>] {
        &self.columns
    }

    pub fn settings(&self) -> &ImportSettings {
        &self.settings
    }

    pub fn target_table(&self) -> TargetTable {
        TargetTable {
            schema_name: self.table.schema_name().to_string(),
            table_name: self.table.table_name().to_string(),
            use_quoting: self.table.use_quoting(),
            columns: self.columns.iter().map(ColumnBinding::target_column).collect(),
        }
    }

    /// The `COPY ... FROM STDIN BINARY;` statement sent to the server.
    pub fn copy_command(&self) -> String {
        let columns: Vec<&str> = self.columns.iter().map(|c| c.column_name()).collect();
        let copy = CopyBuilder::new(table_ref(self.table.schema_name(), self.table.table_name()))
            .columns(&columns)
            .build();
        render_sql(&copy, &Postgres::new(self.table.use_quoting()))
    }

    /// Blocking variant of [`Self::save_all_async`], without cancellation.
    ///
    /// The save is driven on the calling thread. Inside a multi-thread Tokio
    /// runtime (including `spawn_blocking` threads) the worker is handed over
    /// with `block_in_place`. A current-thread runtime is rejected, since
    /// blocking its only thread would stall the connection task.
    pub fn save_all<C, I>(&self, conn: &C, entities: I) -> Result<u64, CopyError>
    where
        C: BulkImportConnection,
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        let save = || block_on(self.save_all_async(conn, entities, &CancellationToken::new()));
        match Handle::try_current() {
            Err(_) => save(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => {
                Err(CopyError::InvalidArgument(
                    "save_all cannot block a current-thread Tokio runtime, use save_all_async"
                        .to_string(),
                ))
            }
            Ok(_) => tokio::task::block_in_place(save),
        }
    }

    /// Streams `entities` into the table and returns the number of rows the
    /// server imported.
    pub async fn save_all_async<C, I>(
        &self,
        conn: &C,
        entities: I,
        cancel: &CancellationToken,
    ) -> Result<u64, CopyError>
    where
        C: BulkImportConnection,
        I: IntoIterator,
        I::Item: Borrow<E>,
    {
        self.save_all_stream(conn, stream::iter(entities), cancel)
            .await
    }

    /// Like [`Self::save_all_async`], pulling entities from a stream.
    pub async fn save_all_stream<C, S>(
        &self,
        conn: &C,
        entities: S,
        cancel: &CancellationToken,
    ) -> Result<u64, CopyError>
    where
        C: BulkImportConnection,
        S: Stream,
        S::Item: Borrow<E>,
    {
        let command = self.copy_command();
        if cancel.is_cancelled() {
            return Err(CopyError::Cancelled { command, row: 0 });
        }
        self.check_ready(conn)?;

        let types = self.resolve_types(conn, &command).await?;
        debug!(%command, "Starting binary COPY");

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            opened = conn.begin_binary_import(&command, &self.settings) => Some(opened),
        };
        let Some(opened) = opened else {
            return Err(CopyError::Cancelled { command, row: 0 });
        };
        let mut importer = opened
            .map_err(|source| protocol_error(conn, &command, CopyPhase::Open, 0, None, source))?;

        let streamed = match write_rows(&mut importer, &self.columns, &types, entities, cancel).await
        {
            Ok(StreamOutcome::Finished(rows)) => rows,
            Ok(StreamOutcome::Cancelled(rows)) => return Err(abort_cancelled(&mut importer, command, rows)),
            Err(WriteFailure {
                row,
                column,
                source,
            }) => {
                let err = protocol_error(conn, &command, CopyPhase::Write, row, column, source);
                return Err(abort(&mut importer, err));
            }
        };

        if cancel.is_cancelled() {
            return Err(abort_cancelled(&mut importer, command, streamed));
        }

        let imported = match importer.complete().await {
            Ok(imported) => imported,
            Err(source) => {
                let err = protocol_error(conn, &command, CopyPhase::Complete, streamed, None, source);
                return Err(abort(&mut importer, err));
            }
        };

        if imported != streamed {
            warn!(
                table = %self.table.fully_qualified_name(),
                streamed,
                imported,
                "Server row count differs from the number of rows streamed"
            );
        }
        info!(
            table = %self.table.fully_qualified_name(),
            rows = imported,
            "COPY completed"
        );
        Ok(imported)
    }

    fn check_ready<C: BulkImportConnection>(&self, conn: &C) -> Result<(), CopyError> {
        if conn.is_closed() {
            return Err(CopyError::InvalidArgument("Connection is closed".to_string()));
        }
        if self.table.table_name().trim().is_empty() {
            return Err(CopyError::InvalidArgument(
                "Table name must not be empty".to_string(),
            ));
        }
        if self.columns.is_empty() {
            return Err(CopyError::InvalidArgument(format!(
                "No columns mapped for table '{}'",
                self.table.fully_qualified_name()
            )));
        }
        Ok(())
    }

    /// The PostgreSQL type of every column, looking up custom type names on
    /// the connection once per save.
    async fn resolve_types<C: BulkImportConnection>(
        &self,
        conn: &C,
        command: &str,
    ) -> Result<Vec<Type>, CopyError> {
        let mut resolved: HashMap<&str, Type> = HashMap::new();
        let mut types = Vec::with_capacity(self.columns.len());

        for column in &self.columns {
            let ty = match (column.pg_type(), column.unresolved_type_name()) {
                (Some(ty), _) => ty.clone(),
                (None, Some(name)) => match resolved.get(name) {
                    Some(ty) => ty.clone(),
                    None => {
                        let ty = conn.resolve_type(name).await.map_err(|source| {
                            protocol_error(
                                conn,
                                command,
                                CopyPhase::Resolve,
                                0,
                                Some(column.column_name().to_string()),
                                source,
                            )
                        })?;
                        resolved.insert(name, ty.clone());
                        ty
                    }
                },
                (None, None) => {
                    return Err(CopyError::InvalidArgument(format!(
                        "Column '{}' has no PostgreSQL type",
                        column.column_name()
                    )));
                }
            };
            types.push(ty);
        }
        Ok(types)
    }
}

fn protocol_error<C: BulkImportConnection>(
    conn: &C,
    command: &str,
    phase: CopyPhase,
    row: u64,
    column: Option<String>,
    source: ChannelError,
) -> CopyError {
    CopyError::from(ProtocolError {
        command: command.to_string(),
        phase,
        row,
        column,
        connection_closed: conn.is_closed(),
        source,
    })
}

fn abort<I: BinaryImporter>(importer: &mut I, err: CopyError) -> CopyError {
    importer.cancel();
    warn!(error = %err, "Binary COPY aborted");
    err
}

fn abort_cancelled<I: BinaryImporter>(importer: &mut I, command: String, row: u64) -> CopyError {
    importer.cancel();
    warn!(%command, rows = row, "Binary COPY cancelled");
    CopyError::Cancelled { command, row }
}
