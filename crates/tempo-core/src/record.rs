use chrono::{DateTime, Utc};

use crate::id::RecordId;

/// Identity capability required of every persisted record.
///
/// The store resolves lookups and mutations through this accessor instead of
/// inspecting the record at runtime, so a record type without an id simply
/// does not compile.
pub trait Record {
    fn id(&self) -> RecordId;
}

/// Capability of anything the time monitor can schedule: a deadline plus an
/// optional earlier reminder instant.
pub trait TimedObject: Record {
    /// The deadline.
    fn complete_date(&self) -> DateTime<Utc>;

    /// Optional reminder time ahead of the deadline.
    fn notify_date(&self) -> Option<DateTime<Utc>>;

    fn is_done(&self) -> bool;

    /// The instant the monitor should fire on next: the reminder when one is
    /// set and still in the future, otherwise the deadline.
    fn target_time(&self) -> DateTime<Utc> {
        match self.notify_date() {
            Some(notify) if notify > Utc::now() => notify,
            _ => self.complete_date(),
        }
    }
}
