use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use tempo_core::{dates, RecordId};
use tempo_store::TimedSource;

use crate::error::{MonitorError, Result};
use crate::item::{FireContext, ItemKind, MonitorEvent, MonitorItem, NonObjectCallback, MAX_ACTIVE};

const DEFAULT_TICK: Duration = Duration::from_secs(1);
/// Pause after an unexpected tick failure before the loop resumes.
const LOOP_BACKOFF: Duration = Duration::from_secs(5);

/// Heap key: target time first, then insertion order so same-instant items
/// fire in the order they were registered.
#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct QueueEntry {
    target: DateTime<Utc>,
    seq: u64,
    id: RecordId,
}

/// Queue and active set, always mutated together under one lock.
#[derive(Default)]
struct State {
    queue: BinaryHeap<Reverse<QueueEntry>>,
    active: HashMap<RecordId, MonitorItem>,
    seq: u64,
}

impl State {
    fn insert(&mut self, item: MonitorItem) {
        if self.active.contains_key(&item.id) {
            return;
        }
        self.queue.push(Reverse(QueueEntry {
            target: item.target_time,
            seq: self.seq,
            id: item.id,
        }));
        self.seq += 1;
        self.active.insert(item.id, item);
    }

    fn remove(&mut self, id: RecordId) -> bool {
        if self.active.remove(&id).is_none() {
            return false;
        }
        self.queue.retain(|Reverse(entry)| entry.id != id);
        true
    }

    fn clear(&mut self) {
        self.queue.clear();
        self.active.clear();
    }
}

#[derive(Clone)]
struct Wiring {
    source: Arc<dyn TimedSource>,
    fired_tx: mpsc::Sender<MonitorEvent>,
}

struct Shared {
    state: Mutex<State>,
    wiring: Mutex<Option<Wiring>>,
    running: Mutex<Option<watch::Sender<bool>>>,
    tick: Duration,
}

/// The bounded-working-set scheduler. Cheap to clone; all clones share one
/// queue, active set and loop.
#[derive(Clone)]
pub struct TimeMonitor {
    inner: Arc<Shared>,
}

impl Default for TimeMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeMonitor {
    pub fn new() -> Self {
        Self::with_tick(DEFAULT_TICK)
    }

    /// Monitor with a custom poll interval. Production uses [`new`]; the
    /// short-tick variant exists for integration tests.
    pub fn with_tick(tick: Duration) -> Self {
        Self {
            inner: Arc::new(Shared {
                state: Mutex::new(State::default()),
                wiring: Mutex::new(None),
                running: Mutex::new(None),
                tick,
            }),
        }
    }

    /// Bind the record source and the single event subscriber, then perform
    /// the initial refill. Must run before [`start`](Self::start).
    pub async fn prepare(&self, source: Arc<dyn TimedSource>, fired_tx: mpsc::Sender<MonitorEvent>) {
        info!("preparing time monitor");
        *self.inner.wiring.lock().unwrap() = Some(Wiring { source, fired_tx });
        self.inner.refill(false).await;
        info!(active = self.active_len(), "time monitor prepared");
    }

    /// Launch the tick loop. No-op when already running; errors when
    /// `prepare` has not bound a source yet.
    pub fn start(&self) -> Result<()> {
        if self.inner.wiring.lock().unwrap().is_none() {
            return Err(MonitorError::NotPrepared);
        }
        let mut running = self.inner.running.lock().unwrap();
        if running.is_some() {
            return Ok(());
        }
        let (tx, rx) = watch::channel(false);
        *running = Some(tx);
        let inner = Arc::clone(&self.inner);
        tokio::spawn(run_loop(inner, rx));
        info!("time monitor started");
        Ok(())
    }

    /// Request the loop to stop. Cooperative: checked once per tick, does
    /// not drain an in-flight batch. No-op when already stopped.
    pub fn stop(&self) {
        if let Some(tx) = self.inner.running.lock().unwrap().take() {
            let _ = tx.send(true);
            info!("time monitor stopping");
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.lock().unwrap().is_some()
    }

    /// Track a bare callback. `repeat_hours <= 0` fires once (Ending);
    /// otherwise the item re-arms itself every `repeat_hours` (Cycled).
    pub fn register_non_object(
        &self,
        target_time: DateTime<Utc>,
        callback: NonObjectCallback,
        repeat_hours: i64,
    ) -> RecordId {
        let item = MonitorItem::non_object(target_time, callback, repeat_hours);
        let id = item.id;
        self.inner.state.lock().unwrap().insert(item);
        info!(%id, %target_time, repeat_hours, "non-object monitor registered");
        id
    }

    /// Drop the item from queue and active set atomically. Returns whether
    /// anything was actually removed. With `reload`, a refill is triggered in
    /// the background to backfill the freed slot.
    pub fn remove_monitor(&self, id: RecordId, reload: bool) -> bool {
        let removed = self.inner.state.lock().unwrap().remove(id);
        if removed {
            info!(%id, "monitor removed");
        } else {
            debug!(%id, "monitor no longer exists");
        }
        if reload {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.refill(false).await });
        }
        removed
    }

    /// Guarantee a just-created or just-edited record gets considered for a
    /// slot even when the set is full: refill with one extra slot, then shed
    /// the latest-due object monitor while over capacity. A newcomer due
    /// later than everything active is itself the one shed, so the set never
    /// trades an earlier item for a later one. Non-object items are never
    /// evicted.
    pub async fn try_add_one(&self, id: RecordId) {
        self.inner.refill(true).await;

        let mut state = self.inner.state.lock().unwrap();
        while state.active.len() > MAX_ACTIVE {
            let victim = state
                .active
                .values()
                .filter(|item| item.is_object())
                .max_by_key(|item| item.target_time)
                .map(|item| item.id);
            match victim {
                Some(victim_id) => {
                    state.remove(victim_id);
                    if victim_id == id {
                        debug!(%id, "newcomer due later than active set — not admitted");
                    } else {
                        info!(evicted = %victim_id, admitted = %id, "latest object monitor evicted");
                    }
                }
                // Only non-object items left over capacity; nothing we may evict.
                None => break,
            }
        }
    }

    /// Drop everything — the daily resync path.
    pub fn clear_all(&self) {
        self.inner.state.lock().unwrap().clear();
        info!("all monitor items cleared");
    }

    /// Top the working set up from the source right now instead of waiting
    /// for the next firing. A cleared set stays empty across ticks otherwise:
    /// the tick-side refill only runs after something fired.
    pub async fn refill(&self) {
        self.inner.refill(false).await;
    }

    pub fn active_len(&self) -> usize {
        self.inner.state.lock().unwrap().active.len()
    }

    pub fn queue_len(&self) -> usize {
        self.inner.state.lock().unwrap().queue.len()
    }

    pub fn active_ids(&self) -> Vec<RecordId> {
        self.inner
            .state
            .lock()
            .unwrap()
            .active
            .keys()
            .copied()
            .collect()
    }

    pub fn is_active(&self, id: RecordId) -> bool {
        self.inner.state.lock().unwrap().active.contains_key(&id)
    }
}

impl Shared {
    /// Pull the next candidates from the source and top the working set up
    /// to capacity (`one_more` grants a single extra slot for a forced add).
    /// Source errors degrade to an empty pass; the next tick retries.
    async fn refill(&self, one_more: bool) {
        let Some(wiring) = self.wiring.lock().unwrap().clone() else {
            return;
        };

        let mut needed = MAX_ACTIVE as i64 - self.state.lock().unwrap().active.len() as i64;
        if one_more {
            needed = if needed <= 0 { 1 } else { needed + 1 };
        }
        if needed <= 0 {
            return;
        }

        let snapshots = match wiring.source.load().await {
            Ok(snapshots) => snapshots,
            Err(e) => {
                warn!("refill query failed, retrying next tick: {e}");
                return;
            }
        };

        let mut candidates: Vec<_> = {
            let state = self.state.lock().unwrap();
            snapshots
                .into_iter()
                .filter(|s| !s.done)
                .filter(|s| !state.active.contains_key(&s.id))
                .filter(|s| {
                    s.notify_date.map(dates::is_today_scheduled).unwrap_or(false)
                        || dates::is_today_scheduled(s.complete_date)
                })
                .collect()
        };
        candidates.sort_by_key(|s| s.target_time());

        let mut state = self.state.lock().unwrap();
        for snapshot in candidates.into_iter().take(needed as usize) {
            state.insert(MonitorItem::from_snapshot(&snapshot));
        }
    }

    /// One poll pass: collect everything due under the lock, then execute
    /// the batch outside it, in ascending target order.
    async fn tick(&self) -> Result<()> {
        let now = Utc::now();
        let fired: Vec<MonitorItem> = {
            let mut state = self.state.lock().unwrap();
            let mut batch = Vec::new();
            while let Some(Reverse(head)) = state.queue.peek() {
                if head.target > now {
                    break;
                }
                let id = head.id;
                state.queue.pop();
                if let Some(item) = state.active.remove(&id) {
                    batch.push(item);
                }
            }
            batch
        };

        if fired.is_empty() {
            return Ok(());
        }

        let wiring = self.wiring.lock().unwrap().clone();
        for item in &fired {
            // Re-arm perpetual items before their callback runs: a resync
            // triggered from inside the callback must already see the
            // checker tracked, or its clear-and-reregister could leave two.
            if item.context == FireContext::Cycled && item.repeat_hours > 0 {
                self.state.lock().unwrap().insert(item.rearmed());
            }

            match &item.kind {
                ItemKind::Object => {
                    if let Some(w) = &wiring {
                        let event = MonitorEvent {
                            id: item.id,
                            context: item.context,
                        };
                        if w.fired_tx.send(event).await.is_err() {
                            warn!(id = %item.id, "event subscriber gone — item dropped");
                        }
                    }
                }
                ItemKind::Callback(callback) => {
                    let callback = Arc::clone(callback);
                    if catch_unwind(AssertUnwindSafe(|| callback())).is_err() {
                        error!(id = %item.id, "monitor callback panicked");
                    }
                }
            }
        }

        self.refill(false).await;
        Ok(())
    }
}

async fn run_loop(inner: Arc<Shared>, mut shutdown: watch::Receiver<bool>) {
    let mut interval = tokio::time::interval(inner.tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = inner.tick().await {
                    error!("monitor tick error: {e}");
                    tokio::time::sleep(LOOP_BACKOFF).await;
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("time monitor stopped");
                    break;
                }
            }
        }
    }
}
