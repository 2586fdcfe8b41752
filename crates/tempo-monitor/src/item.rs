use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use tempo_core::RecordId;
use tempo_store::TimedSnapshot;

/// Hard cap on the in-memory working set. Everything past the six
/// earliest-due records stays on disk until a slot frees up.
pub const MAX_ACTIVE: usize = 6;

/// Why an item fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireContext {
    /// The early reminder time arrived; the deadline is still ahead.
    Notification,
    /// The deadline itself arrived.
    Ending,
    /// Periodic internal re-arm (daily checker). Never leaves the process.
    Cycled,
}

/// What the monitor hands its single subscriber when an object item fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorEvent {
    pub id: RecordId,
    pub context: FireContext,
}

/// Callback carried by non-object items. Panics are caught and logged by the
/// tick loop so one bad callback cannot stall the batch.
pub type NonObjectCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub(crate) enum ItemKind {
    /// Backed by a stored record; fires as a [`MonitorEvent`].
    Object,
    /// Bare callback (daily checker and friends).
    Callback(NonObjectCallback),
}

/// One tracked entry of the active set.
#[derive(Clone)]
pub(crate) struct MonitorItem {
    pub id: RecordId,
    pub target_time: DateTime<Utc>,
    pub context: FireContext,
    /// Hours until re-arm; > 0 only for Cycled items.
    pub repeat_hours: i64,
    pub kind: ItemKind,
}

impl MonitorItem {
    pub fn from_snapshot(snapshot: &TimedSnapshot) -> Self {
        let context = match snapshot.notify_date {
            Some(notify) if notify > Utc::now() => FireContext::Notification,
            _ => FireContext::Ending,
        };
        Self {
            id: snapshot.id,
            target_time: snapshot.target_time(),
            context,
            repeat_hours: 0,
            kind: ItemKind::Object,
        }
    }

    pub fn non_object(
        target_time: DateTime<Utc>,
        callback: NonObjectCallback,
        repeat_hours: i64,
    ) -> Self {
        let (context, repeat_hours) = if repeat_hours <= 0 {
            (FireContext::Ending, 0)
        } else {
            (FireContext::Cycled, repeat_hours)
        };
        Self {
            id: RecordId::new(),
            target_time,
            context,
            repeat_hours,
            kind: ItemKind::Callback(callback),
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self.kind, ItemKind::Object)
    }

    /// The same item pushed one period into the future.
    pub fn rearmed(&self) -> Self {
        let mut next = self.clone();
        next.target_time = self.target_time + Duration::hours(self.repeat_hours);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(
        complete: DateTime<Utc>,
        notify: Option<DateTime<Utc>>,
    ) -> TimedSnapshot {
        TimedSnapshot {
            id: RecordId::new(),
            complete_date: complete,
            notify_date: notify,
            done: false,
        }
    }

    #[test]
    fn future_notify_date_classifies_as_notification() {
        let snap = snapshot(
            Utc::now() + Duration::minutes(30),
            Some(Utc::now() + Duration::minutes(20)),
        );
        let item = MonitorItem::from_snapshot(&snap);
        assert_eq!(item.context, FireContext::Notification);
        assert_eq!(item.target_time, snap.notify_date.unwrap());
    }

    #[test]
    fn passed_notify_date_classifies_as_ending() {
        let snap = snapshot(
            Utc::now() + Duration::minutes(30),
            Some(Utc::now() - Duration::minutes(1)),
        );
        let item = MonitorItem::from_snapshot(&snap);
        assert_eq!(item.context, FireContext::Ending);
        assert_eq!(item.target_time, snap.complete_date);
    }

    #[test]
    fn non_object_repeat_decides_context() {
        let cb: NonObjectCallback = Arc::new(|| {});
        let ending = MonitorItem::non_object(Utc::now(), cb.clone(), 0);
        assert_eq!(ending.context, FireContext::Ending);
        let cycled = MonitorItem::non_object(Utc::now(), cb, 24);
        assert_eq!(cycled.context, FireContext::Cycled);
        assert_eq!(cycled.repeat_hours, 24);
    }

    #[test]
    fn rearm_advances_by_repeat_hours() {
        let cb: NonObjectCallback = Arc::new(|| {});
        let item = MonitorItem::non_object(Utc::now(), cb, 24);
        let next = item.rearmed();
        assert_eq!(next.target_time - item.target_time, Duration::hours(24));
        assert_eq!(next.id, item.id);
    }
}
