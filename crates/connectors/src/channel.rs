//! The bulk import channel: the narrow surface of a database connection that
//! the copy engine needs to stream a binary COPY.

use crate::{error::ChannelError, settings::ImportSettings};
use async_trait::async_trait;
use tokio_postgres::types::{ToSql, Type};

/// A connection that can open binary COPY sessions.
#[async_trait]
pub trait BulkImportConnection: Send + Sync {
    type Importer: BinaryImporter;

    /// Returns `true` if the connection is known to be unusable.
    fn is_closed(&self) -> bool {
        false
    }

    /// Starts `COPY ... FROM STDIN BINARY` with the given command text.
    async fn begin_binary_import(
        &self,
        command: &str,
        settings: &ImportSettings,
    ) -> Result<Self::Importer, ChannelError>;

    /// Looks up a type by name on the server, e.g. an enum or composite type.
    async fn resolve_type(&self, type_name: &str) -> Result<Type, ChannelError>;
}

/// An open binary COPY session.
///
/// A session ends with exactly one of [`complete`](Self::complete) or
/// [`cancel`](Self::cancel). Dropping an importer without completing it
/// aborts the COPY.
#[async_trait]
pub trait BinaryImporter: Send {
    async fn start_row(&mut self) -> Result<(), ChannelError>;

    async fn write(&mut self, value: &(dyn ToSql + Sync), ty: &Type) -> Result<(), ChannelError>;

    async fn write_null(&mut self) -> Result<(), ChannelError>;

    /// Sends the trailer and returns the number of rows the server imported.
    async fn complete(&mut self) -> Result<u64, ChannelError>;

    fn cancel(&mut self);
}
