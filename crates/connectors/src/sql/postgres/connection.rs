use crate::{
    channel::BulkImportConnection, error::ChannelError, settings::ImportSettings,
    sql::postgres::importer::PgBinaryImporter,
};
use async_trait::async_trait;
use tokio_postgres::{Client, GenericClient, Transaction, types::Type};
use tracing::debug;

#[async_trait]
impl BulkImportConnection for Client {
    type Importer = PgBinaryImporter;

    fn is_closed(&self) -> bool {
        Client::is_closed(self)
    }

    async fn begin_binary_import(
        &self,
        command: &str,
        settings: &ImportSettings,
    ) -> Result<PgBinaryImporter, ChannelError> {
        let sink = self.copy_in(command).await?;
        Ok(PgBinaryImporter::new(sink, settings))
    }

    async fn resolve_type(&self, type_name: &str) -> Result<Type, ChannelError> {
        resolve_type(self, type_name).await
    }
}

#[async_trait]
impl BulkImportConnection for Transaction<'_> {
    type Importer = PgBinaryImporter;

    async fn begin_binary_import(
        &self,
        command: &str,
        settings: &ImportSettings,
    ) -> Result<PgBinaryImporter, ChannelError> {
        let sink = self.copy_in(command).await?;
        Ok(PgBinaryImporter::new(sink, settings))
    }

    async fn resolve_type(&self, type_name: &str) -> Result<Type, ChannelError> {
        resolve_type(self, type_name).await
    }
}

/// Resolves a type name by preparing a typed NULL literal and reading back the
/// type of its single result column.
async fn resolve_type<C>(client: &C, type_name: &str) -> Result<Type, ChannelError>
where
    C: GenericClient + Sync,
{
    let statement = client.prepare(&format!("SELECT NULL::{type_name}")).await?;
    let ty = statement
        .columns()
        .first()
        .map(|column| column.type_().clone())
        .ok_or_else(|| ChannelError::UnknownType(type_name.to_string()))?;

    debug!(type_name, oid = ty.oid(), resolved = %ty, "Resolved PostgreSQL type");
    Ok(ty)
}
