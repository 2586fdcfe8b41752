//! `tempo-monitor` — bounded-working-set time monitor.
//!
//! # Overview
//!
//! The monitor keeps at most [`MAX_ACTIVE`](item::MAX_ACTIVE) records from
//! the store in memory as *monitor items*, ordered by their target time in a
//! min-heap. A one-second tick loop fires every item whose time has arrived
//! and then refills the working set from the [`TimedSource`]
//! (`tempo-store`), so the full record set never has to live in memory.
//!
//! Fired object items are delivered on a single-consumer mpsc channel; the
//! daemon's bridge turns them into wire messages. Non-object items carry
//! plain callbacks and can re-arm themselves on a fixed period (the daily
//! checker).

pub mod engine;
pub mod error;
pub mod item;

pub use engine::TimeMonitor;
pub use error::{MonitorError, Result};
pub use item::{FireContext, MonitorEvent, NonObjectCallback, MAX_ACTIVE};
pub use tempo_store::{TimedSnapshot, TimedSource};
