//! `tempo-core` — shared types for the Tempo process family.
//!
//! Holds the 12-byte [`RecordId`], the [`TimedObject`] capability the time
//! monitor schedules against, the persisted [`Task`] / [`Category`] records,
//! local-calendar date helpers, and the workspace configuration.

pub mod config;
pub mod dates;
pub mod error;
pub mod id;
pub mod record;
pub mod task;

pub use config::TempoConfig;
pub use error::{CoreError, Result};
pub use id::RecordId;
pub use record::{Record, TimedObject};
pub use task::{Category, Task};
