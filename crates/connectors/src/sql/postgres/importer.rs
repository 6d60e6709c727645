use crate::{
    channel::BinaryImporter, error::ChannelError, settings::ImportSettings,
    sql::postgres::frame::CopyFrame,
};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::SinkExt;
use std::pin::Pin;
use tokio_postgres::{
    CopyInSink,
    types::{ToSql, Type},
};
use tracing::debug;

/// Binary COPY session over a `tokio-postgres` copy-in sink.
///
/// Rows are encoded into a [`CopyFrame`] and sent whenever the buffer passes
/// the flush threshold at a row boundary. Dropping the importer drops the
/// sink, which makes the server abort the COPY.
pub struct PgBinaryImporter {
    sink: Option<Pin<Box<CopyInSink<Bytes>>>>,
    frame: CopyFrame,
    flush_threshold: usize,
}

impl PgBinaryImporter {
    pub fn new(sink: CopyInSink<Bytes>, settings: &ImportSettings) -> Self {
        Self {
            sink: Some(Box::pin(sink)),
            frame: CopyFrame::new(),
            flush_threshold: settings.flush_threshold,
        }
    }

    fn sink(&mut self) -> Result<&mut Pin<Box<CopyInSink<Bytes>>>, ChannelError> {
        self.sink
            .as_mut()
            .ok_or_else(|| ChannelError::State("COPY session is already closed".to_string()))
    }

    async fn flush(&mut self) -> Result<(), ChannelError> {
        let bytes = self.frame.take()?;
        if bytes.is_empty() {
            return Ok(());
        }
        debug!(bytes = bytes.len(), "Flushing COPY buffer");
        self.sink()?.as_mut().send(bytes).await?;
        Ok(())
    }
}

#[async_trait]
impl BinaryImporter for PgBinaryImporter {
    async fn start_row(&mut self) -> Result<(), ChannelError> {
        self.sink()?;
        self.frame.end_row();
        if self.frame.len() >= self.flush_threshold {
            self.flush().await?;
        }
        self.frame.start_row();
        Ok(())
    }

    async fn write(&mut self, value: &(dyn ToSql + Sync), ty: &Type) -> Result<(), ChannelError> {
        self.sink()?;
        self.frame.write_value(value, ty)
    }

    async fn write_null(&mut self) -> Result<(), ChannelError> {
        self.sink()?;
        self.frame.write_null()
    }

    async fn complete(&mut self) -> Result<u64, ChannelError> {
        let mut sink = self
            .sink
            .take()
            .ok_or_else(|| ChannelError::State("COPY session is already closed".to_string()))?;
        let bytes = self.frame.finish();
        sink.as_mut().send(bytes).await?;
        let rows = sink.as_mut().finish().await?;
        Ok(rows)
    }

    fn cancel(&mut self) {
        if self.sink.take().is_some() {
            debug!("COPY session aborted");
        }
    }
}
