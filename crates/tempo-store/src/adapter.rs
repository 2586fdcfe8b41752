//! The narrow view of a store the time monitor consumes.
//!
//! The monitor only ever needs the timing fields of a record, never the
//! record itself, so the adapter copies those into plain snapshots instead of
//! handing out trait objects.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;

use tempo_core::{Record, RecordId, TimedObject};

use crate::error::Result;
use crate::file_store::FileStore;

/// Timing fields of one record, detached from its concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedSnapshot {
    pub id: RecordId,
    pub complete_date: DateTime<Utc>,
    pub notify_date: Option<DateTime<Utc>>,
    pub done: bool,
}

impl TimedSnapshot {
    pub fn of(obj: &impl TimedObject) -> Self {
        Self {
            id: obj.id(),
            complete_date: obj.complete_date(),
            notify_date: obj.notify_date(),
            done: obj.is_done(),
        }
    }

    /// Same rule as [`TimedObject::target_time`].
    pub fn target_time(&self) -> DateTime<Utc> {
        match self.notify_date {
            Some(notify) if notify > Utc::now() => notify,
            _ => self.complete_date,
        }
    }
}

/// What the monitor's refill queries: the full current set of timing
/// snapshots. Errors are allowed — the monitor treats them as an empty pass.
#[async_trait]
pub trait TimedSource: Send + Sync {
    async fn load(&self) -> Result<Vec<TimedSnapshot>>;
}

/// Adapts a typed [`FileStore`] to the [`TimedSource`] capability.
pub struct StoreAdapter<T> {
    store: Arc<FileStore<T>>,
}

impl<T> StoreAdapter<T> {
    pub fn new(store: Arc<FileStore<T>>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<T> TimedSource for StoreAdapter<T>
where
    T: TimedObject + Record + Serialize + DeserializeOwned + Clone + Send + Sync,
{
    async fn load(&self) -> Result<Vec<TimedSnapshot>> {
        // Uncached: the refill must observe edits made since the last pass.
        Ok(self
            .store
            .get_all(None)
            .iter()
            .map(TimedSnapshot::of)
            .collect())
    }
}
