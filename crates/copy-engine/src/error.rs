use connectors::error::ChannelError;
use model::core::validation::TypeError;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CopyError {
    /// A precondition failed before any I/O took place.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A column could not be registered.
    #[error("Invalid mapping for column '{column}': {source}")]
    Mapping {
        column: String,
        #[source]
        source: TypeError,
    },

    #[error(transparent)]
    Protocol(Box<ProtocolError>),

    /// The cancellation token fired; `row` rows had been streamed.
    #[error("COPY cancelled after {row} rows: {command}")]
    Cancelled { command: String, row: u64 },
}

impl From<ProtocolError> for CopyError {
    fn from(err: ProtocolError) -> Self {
        CopyError::Protocol(Box::new(err))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyPhase {
    Resolve,
    Open,
    Write,
    Complete,
}

impl fmt::Display for CopyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyPhase::Resolve => f.write_str("type resolution"),
            CopyPhase::Open => f.write_str("open"),
            CopyPhase::Write => f.write_str("write"),
            CopyPhase::Complete => f.write_str("complete"),
        }
    }
}

/// A failure of the bulk import channel, with the position in the stream
/// where it happened. `row` is 1-based; 0 means no row had been started.
#[derive(Debug, Error)]
#[error("COPY {phase} failed at row {row}{}: {source} ({command})", column_suffix(.column))]
pub struct ProtocolError {
    pub command: String,
    pub phase: CopyPhase,
    pub row: u64,
    pub column: Option<String>,
    pub connection_closed: bool,
    #[source]
    pub source: ChannelError,
}

fn column_suffix(column: &Option<String>) -> String {
    column
        .as_deref()
        .map(|c| format!(", column '{c}'"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_error_message() {
        let err = CopyError::from(ProtocolError {
            command: "COPY t(a) FROM STDIN BINARY;".to_string(),
            phase: CopyPhase::Write,
            row: 3,
            column: Some("a".to_string()),
            connection_closed: false,
            source: ChannelError::State("boom".to_string()),
        });
        assert_eq!(
            err.to_string(),
            "COPY write failed at row 3, column 'a': Importer state error: boom (COPY t(a) FROM STDIN BINARY;)"
        );
    }
}
