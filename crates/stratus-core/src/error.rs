//! Error types for stratus-core.

/// Result type for stratus-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the sync engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transient remote source failure (timeout, unreachable, bad response).
    #[error("Remote source error: {0}")]
    Remote(String),

    /// Local persistence error.
    #[error("Store error: {0}")]
    Store(#[from] stratus_store::Error),

    /// Notification delivery failure. Best-effort; never rolls back state.
    #[error("Notification delivery failed: {0}")]
    Notification(String),
}

impl Error {
    /// Convenience constructor for remote failures.
    pub fn remote(msg: impl Into<String>) -> Self {
        Error::Remote(msg.into())
    }
}
