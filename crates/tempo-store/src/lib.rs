//! `tempo-store` — file-backed record store.
//!
//! One MessagePack container per record type, rewritten wholesale on every
//! mutation, with a short-lived keyed read cache. Reads degrade to an empty
//! set on I/O or decode trouble; writes report failure and leave callers to
//! treat the operation as not having happened. There is deliberately no
//! write-ahead log and no atomic rename — see the corruption tests.

pub mod adapter;
pub mod error;
pub mod file_store;

pub use adapter::{StoreAdapter, TimedSnapshot, TimedSource};
pub use error::{Result, StoreError};
pub use file_store::FileStore;
