use thiserror::Error;

use crate::frame::Endpoint;

/// Errors that can occur within the wire-protocol subsystem.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Illegal frame length {0}, expected 2 or 14")]
    BadLength(usize),

    #[error("Unknown endpoint code {0}")]
    UnknownEndpoint(u8),

    #[error("Frame targets {target:?} but was received by {receiver:?}")]
    WrongTarget { target: Endpoint, receiver: Endpoint },

    #[error("Unknown function code {function} for {target:?}")]
    UnknownFunction { target: Endpoint, function: u8 },

    #[error("Function code {function} for {target:?} requires a record id")]
    MissingId { target: Endpoint, function: u8 },

    #[error("Malformed record id: {0}")]
    BadId(#[from] tempo_core::CoreError),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
