use thiserror::Error;

/// Errors that can occur within the persistence subsystem.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),

    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),

    /// The backing source is unavailable (used by monitor-facing adapters).
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
