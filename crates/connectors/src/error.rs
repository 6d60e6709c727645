use thiserror::Error;

/// Errors raised by a bulk import channel while a COPY is in flight.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// Any driver or server error, including a rejected COPY.
    #[error("Postgres error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A value could not be converted into its binary representation.
    #[error("Encoding error: {0}")]
    Encode(Box<dyn std::error::Error + Send + Sync>),

    /// The importer was used out of order (e.g. a write before `start_row`).
    #[error("Importer state error: {0}")]
    State(String),

    #[error("Unknown PostgreSQL type: {0}")]
    UnknownType(String),
}

/// Errors happening during connection setup.
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("Invalid connection URL: {0}")]
    InvalidUrl(String),

    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("Postgres connection failed: {0}")]
    Postgres(#[from] tokio_postgres::Error),
}
