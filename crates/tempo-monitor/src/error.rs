use thiserror::Error;

/// Errors that can occur within the monitor subsystem.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// `start` was called before `prepare` bound a source and subscriber.
    #[error("Monitor not prepared: call prepare() first")]
    NotPrepared,

    /// The refill query against the backing source failed.
    #[error("Source error: {0}")]
    Source(#[from] tempo_store::StoreError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
