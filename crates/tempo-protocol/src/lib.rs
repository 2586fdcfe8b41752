//! `tempo-protocol` — the binary wire language of the process family.
//!
//! A frame is `[target: 1][function: 1]` plus an optional 12-byte record id;
//! legal frame lengths are exactly 2 and 14 bytes. Function codes are scoped
//! per receiving endpoint, so the same code means different things to the UI
//! and the notifier. Anything malformed is rejected at decode time; callers
//! log and drop, they never guess.

pub mod error;
pub mod frame;
pub mod functions;

pub use error::{ProtocolError, Result};
pub use frame::{Endpoint, Frame, FRAME_LEN_BARE, FRAME_LEN_WITH_ID};
pub use functions::{NotifierFn, ServerFn, UiFn};

use tempo_monitor::{FireContext, MonitorEvent};

/// Map one monitor firing to the frames it puts on the wire.
///
/// A reminder only pokes the notifier; a deadline tells the notifier to
/// announce the miss *and* the UI to restyle the record. Internal re-arms
/// never leave the process.
pub fn fan_out(event: &MonitorEvent) -> Vec<Frame> {
    match event.context {
        FireContext::Notification => vec![NotifierFn::ShowDueSoon.with_id(event.id)],
        FireContext::Ending => vec![
            NotifierFn::ShowMissed.with_id(event.id),
            UiFn::MarkMissed.with_id(event.id),
        ],
        FireContext::Cycled => Vec::new(),
    }
}
