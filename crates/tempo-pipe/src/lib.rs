//! `tempo-pipe` — duplex byte transport over Unix domain sockets.
//!
//! Each socket is a *slot*: one listener, one live peer at a time. Inbound
//! bytes and connection edges surface as [`PipeEvent`]s on an mpsc channel;
//! outbound writes go through a shared write half behind an async lock.
//! When a peer drops (zero-length read), the slot emits `Disconnected` and
//! the accept loop immediately waits for the next peer.

pub mod client;
pub mod error;
pub mod server;

pub use client::PipeClient;
pub use error::{PipeError, Result};
pub use server::PipeServer;

/// What a pipe endpoint reports to its consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipeEvent {
    /// A peer attached to the slot (server side only).
    Connected,
    /// One read's worth of inbound bytes.
    Data(Vec<u8>),
    /// The peer went away; the slot is writable again once a new peer
    /// attaches (server) or never (client).
    Disconnected,
}
