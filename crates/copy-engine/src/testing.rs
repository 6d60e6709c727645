//! An in-memory bulk import connection that records every call, used to
//! check what the helper writes without a server.

use async_trait::async_trait;
use bytes::BytesMut;
use connectors::{
    channel::{BinaryImporter, BulkImportConnection},
    error::ChannelError,
    settings::ImportSettings,
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio_postgres::types::{IsNull, ToSql, Type};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Open(String),
    StartRow,
    Value { ty: Type, bytes: Vec<u8> },
    Null,
    Complete,
    Cancel,
}

#[derive(Default)]
struct Shared {
    events: Mutex<Vec<Event>>,
    resolved: Mutex<Vec<String>>,
    writes: AtomicUsize,
    rows: AtomicUsize,
}

#[derive(Clone, Default)]
pub struct RecordingConnection {
    shared: Arc<Shared>,
    closed: bool,
    fail_on_open: bool,
    fail_on_write: Option<usize>,
    cancel_at_row: Option<(usize, CancellationToken)>,
    types: HashMap<String, Type>,
    reported_rows: Option<u64>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn fail_on_open(mut self) -> Self {
        self.fail_on_open = true;
        self
    }

    /// Fails the n-th value or null write, counting from 1.
    pub fn fail_on_write(mut self, n: usize) -> Self {
        self.fail_on_write = Some(n);
        self
    }

    /// Cancels `token` when row `n` is started.
    pub fn cancel_at_row(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_at_row = Some((n, token));
        self
    }

    pub fn with_type(mut self, name: &str, ty: Type) -> Self {
        self.types.insert(name.to_string(), ty);
        self
    }

    /// Overrides the row count returned on completion.
    pub fn report_rows(mut self, rows: u64) -> Self {
        self.reported_rows = Some(rows);
        self
    }

    pub fn events(&self) -> Vec<Event> {
        self.shared.events.lock().unwrap().clone()
    }

    /// Type names looked up on the connection, in order.
    pub fn resolved(&self) -> Vec<String> {
        self.shared.resolved.lock().unwrap().clone()
    }

    fn record(&self, event: Event) {
        self.shared.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl BulkImportConnection for RecordingConnection {
    type Importer = RecordingImporter;

    fn is_closed(&self) -> bool {
        self.closed
    }

    async fn begin_binary_import(
        &self,
        command: &str,
        _settings: &ImportSettings,
    ) -> Result<Self::Importer, ChannelError> {
        if self.fail_on_open {
            return Err(ChannelError::State("open rejected".to_string()));
        }
        self.record(Event::Open(command.to_string()));
        Ok(RecordingImporter {
            conn: self.clone(),
        })
    }

    async fn resolve_type(&self, type_name: &str) -> Result<Type, ChannelError> {
        self.shared
            .resolved
            .lock()
            .unwrap()
            .push(type_name.to_string());
        self.types
            .get(type_name)
            .cloned()
            .ok_or_else(|| ChannelError::UnknownType(type_name.to_string()))
    }
}

pub struct RecordingImporter {
    conn: RecordingConnection,
}

impl RecordingImporter {
    fn count_write(&self) -> Result<(), ChannelError> {
        let n = self.conn.shared.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if self.conn.fail_on_write == Some(n) {
            return Err(ChannelError::State(format!("write {n} rejected")));
        }
        Ok(())
    }
}

#[async_trait]
impl BinaryImporter for RecordingImporter {
    async fn start_row(&mut self) -> Result<(), ChannelError> {
        let row = self.conn.shared.rows.fetch_add(1, Ordering::SeqCst) + 1;
        self.conn.record(Event::StartRow);
        if let Some((n, token)) = &self.conn.cancel_at_row {
            if *n == row {
                token.cancel();
            }
        }
        Ok(())
    }

    async fn write(&mut self, value: &(dyn ToSql + Sync), ty: &Type) -> Result<(), ChannelError> {
        self.count_write()?;
        let mut buf = BytesMut::new();
        let event = match value.to_sql_checked(ty, &mut buf).map_err(ChannelError::Encode)? {
            IsNull::Yes => Event::Null,
            IsNull::No => Event::Value {
                ty: ty.clone(),
                bytes: buf.to_vec(),
            },
        };
        self.conn.record(event);
        Ok(())
    }

    async fn write_null(&mut self) -> Result<(), ChannelError> {
        self.count_write()?;
        self.conn.record(Event::Null);
        Ok(())
    }

    async fn complete(&mut self) -> Result<u64, ChannelError> {
        self.conn.record(Event::Complete);
        let rows = self.conn.shared.rows.load(Ordering::SeqCst) as u64;
        Ok(self.conn.reported_rows.unwrap_or(rows))
    }

    fn cancel(&mut self) {
        self.conn.record(Event::Cancel);
    }
}
