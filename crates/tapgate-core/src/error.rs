use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Identifier errors
    #[error("Invalid device ID: {0}")]
    InvalidDeviceId(String),

    #[error("Invalid badge ID: {0}")]
    InvalidBadgeId(String),

    // Wire value errors
    #[error("Invalid timestamp '{value}': {message}")]
    InvalidTimestamp { value: String, message: String },

    #[error("Unknown control command: {0}")]
    UnknownCommand(String),

    #[error("Unknown door state: {0}")]
    UnknownDoorState(String),

    #[error("Unknown scan source: {0}")]
    UnknownScanSource(String),

    #[error("Unknown scan error code: {0}")]
    UnknownErrorCode(String),

    #[error("Unknown acknowledgement status: {0}")]
    UnknownAckStatus(String),
}

pub type Result<T> = std::result::Result<T, Error>;
