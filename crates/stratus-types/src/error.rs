//! Error types for stratus-types.

/// Result type for parsing operations.
pub type ParseResult<T> = std::result::Result<T, ParseError>;

/// Errors that can occur when parsing stored or remote data.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// Unknown sensor code encountered.
    #[error("Unknown sensor code: {0}")]
    UnknownSensor(String),

    /// Unknown sync status label encountered.
    #[error("Unknown sync status: {0}")]
    UnknownStatus(String),

    /// Invalid calendar date string.
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}
