use tapgate_bus::BusError;
use tapgate_protocol::ProtocolError;
use tapgate_storage::StorageError;
use thiserror::Error;

/// Errors surfaced by the ingestion pipeline.
///
/// Malformed input never reaches this type; handlers drop it with a
/// diagnostic and return `Ok`. What does surface here are system faults
/// that the service loop logs and isolates to the offending message.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Bus error: {0}")]
    Bus(#[from] BusError),
}

/// Result type alias for ingestion operations
pub type IngestResult<T> = Result<T, IngestError>;
