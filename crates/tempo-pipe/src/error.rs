use thiserror::Error;

/// Errors that can occur within the transport subsystem.
#[derive(Debug, Error)]
pub enum PipeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No peer is attached to the slot right now.
    #[error("No peer connected")]
    NotConnected,

    #[error("Connect timed out after {0}ms")]
    ConnectTimeout(u64),
}

pub type Result<T> = std::result::Result<T, PipeError>;
