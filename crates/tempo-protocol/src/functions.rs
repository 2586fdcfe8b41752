//! Per-endpoint function codes. Every enum mirrors one receiving process's
//! dispatch table; the discriminant is the second wire byte.

use tempo_core::RecordId;

use crate::error::{ProtocolError, Result};
use crate::frame::{Endpoint, Frame, FRAME_LEN_BARE, FRAME_LEN_WITH_ID};

/// Wire length of a frame for `receiver`, fixed by its function code.
/// Unknown codes are rejected so a garbled read cannot be re-chunked.
pub(crate) fn wire_len(receiver: Endpoint, function: u8) -> Result<usize> {
    Ok(match receiver {
        Endpoint::Server => {
            ServerFn::try_from(function)?;
            FRAME_LEN_WITH_ID
        }
        Endpoint::Ui => match UiFn::try_from(function)? {
            UiFn::MarkMissed => FRAME_LEN_WITH_ID,
            UiFn::ConnectionClosed | UiFn::ReloadView => FRAME_LEN_BARE,
        },
        Endpoint::Notifier => match NotifierFn::try_from(function)? {
            NotifierFn::ConnectionClosed => FRAME_LEN_BARE,
            NotifierFn::ShowMissed | NotifierFn::ShowDueSoon => FRAME_LEN_WITH_ID,
        },
    })
}

/// What clients ask of the scheduler. All three carry the record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ServerFn {
    /// Stop monitoring the record and backfill the freed slot.
    Cancel = 0,
    /// The record was edited: drop the stale entry, then force it back in.
    Rebind = 1,
    /// The record is new: force it into the working set.
    Ensure = 2,
}

/// What the scheduler tells the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum UiFn {
    /// The server is going away; reconnect or shut down.
    ConnectionClosed = 0,
    /// Persistent state changed wholesale; re-query and re-render.
    ReloadView = 1,
    /// The record's deadline passed; restyle it as missed.
    MarkMissed = 2,
}

/// What the scheduler tells the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NotifierFn {
    ConnectionClosed = 0,
    /// Deadline passed — announce the miss.
    ShowMissed = 1,
    /// Reminder time arrived — announce the record is due soon.
    ShowDueSoon = 2,
}

macro_rules! impl_function_code {
    ($name:ident, $endpoint:expr, [$($variant:ident = $code:literal),+]) => {
        impl TryFrom<u8> for $name {
            type Error = ProtocolError;

            fn try_from(code: u8) -> Result<Self> {
                match code {
                    $($code => Ok($name::$variant),)+
                    other => Err(ProtocolError::UnknownFunction {
                        target: $endpoint,
                        function: other,
                    }),
                }
            }
        }

        impl $name {
            /// Build a payload-free frame for this code.
            pub const fn bare(self) -> Frame {
                Frame::bare($endpoint, self as u8)
            }

            /// Build an id-carrying frame for this code.
            pub const fn with_id(self, id: RecordId) -> Frame {
                Frame::with_id($endpoint, self as u8, id)
            }
        }
    };
}

impl_function_code!(ServerFn, Endpoint::Server, [Cancel = 0, Rebind = 1, Ensure = 2]);
impl_function_code!(UiFn, Endpoint::Ui, [ConnectionClosed = 0, ReloadView = 1, MarkMissed = 2]);
impl_function_code!(
    NotifierFn,
    Endpoint::Notifier,
    [ConnectionClosed = 0, ShowMissed = 1, ShowDueSoon = 2]
);
