//! Rendering seam. The actual widget layer lives outside this crate; it
//! plugs in here. The bundled sink renders to the log, which keeps the
//! process useful headless and the dispatch path testable.

use std::sync::Arc;

use tracing::{info, warn};

use tempo_core::{RecordId, Task};
use tempo_store::FileStore;

/// What the server-driven side of the UI needs from a renderer.
pub trait ViewSink: Send + Sync {
    /// Persistent state changed wholesale; re-query and re-render.
    fn reload(&self);
    /// The record's deadline passed while the view is open.
    fn mark_missed(&self, id: RecordId);
    /// The server said goodbye.
    fn connection_closed(&self);
}

/// Log-backed renderer. Looks task titles up through the keyed read cache,
/// the same path a widget layer would use.
pub struct LogSink {
    store: Arc<FileStore<Task>>,
}

const VIEW_CACHE_KEY: &str = "view";

impl LogSink {
    pub fn new(store: Arc<FileStore<Task>>) -> Self {
        Self { store }
    }
}

impl ViewSink for LogSink {
    fn reload(&self) {
        let count = self.store.count(None);
        info!(tasks = count, "view reloaded");
    }

    fn mark_missed(&self, id: RecordId) {
        match self.store.get_by_id(id, Some(VIEW_CACHE_KEY)) {
            Some(task) => info!(%id, title = %task.title, "task missed"),
            None => warn!(%id, "missed task not found in store"),
        }
    }

    fn connection_closed(&self) {
        info!("server closed the connection");
    }
}
