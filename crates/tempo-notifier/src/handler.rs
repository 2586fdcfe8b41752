//! Frame dispatch for the notifier endpoint: resolve the record behind an
//! announcement and hand human-readable text to the sink.

use std::ops::ControlFlow;
use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use tempo_core::Task;
use tempo_protocol::{Endpoint, Frame, NotifierFn};
use tempo_store::FileStore;

use crate::sink::NotificationSink;

const LOOKUP_CACHE_KEY: &str = "notify";

pub struct Handler {
    store: Arc<FileStore<Task>>,
    sink: Arc<dyn NotificationSink>,
}

impl Handler {
    pub fn new(store: Arc<FileStore<Task>>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { store, sink }
    }

    /// Process one inbound read, which may hold several coalesced frames.
    /// `Break` means the server said goodbye and the process should exit.
    pub fn handle(&self, bytes: &[u8]) -> ControlFlow<()> {
        let frames = match Frame::decode_all(bytes, Endpoint::Notifier) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("dropping invalid read: {e}");
                return ControlFlow::Continue(());
            }
        };
        for frame in frames {
            let function = match NotifierFn::try_from(frame.function) {
                Ok(function) => function,
                Err(e) => {
                    warn!("dropping frame: {e}");
                    continue;
                }
            };

            match function {
                NotifierFn::ConnectionClosed => {
                    info!("server closed the connection");
                    return ControlFlow::Break(());
                }
                NotifierFn::ShowMissed => self.announce(frame, true),
                NotifierFn::ShowDueSoon => self.announce(frame, false),
            }
        }
        ControlFlow::Continue(())
    }

    fn announce(&self, frame: Frame, missed: bool) {
        let id = match frame.require_id() {
            Ok(id) => id,
            Err(e) => {
                warn!("dropping frame: {e}");
                return;
            }
        };
        // The record may have been deleted between firing and delivery.
        let Some(task) = self.store.get_by_id(id, Some(LOOKUP_CACHE_KEY)) else {
            warn!(%id, "announced task not found in store");
            return;
        };

        let due = task.complete_date.with_timezone(&Local).format("%H:%M");
        let (summary, body) = if missed {
            (
                format!("Missed: {}", task.title),
                format!("The deadline ({due}) has passed."),
            )
        } else {
            (
                format!("Due soon: {}", task.title),
                format!("Scheduled for {due}."),
            )
        };
        self.sink.notify(&summary, &body, missed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;
    use tempo_protocol::UiFn;

    #[derive(Default)]
    struct RecordingSink {
        shown: Mutex<Vec<(String, String, bool)>>,
    }

    impl NotificationSink for RecordingSink {
        fn notify(&self, summary: &str, body: &str, urgent: bool) {
            self.shown
                .lock()
                .unwrap()
                .push((summary.into(), body.into(), urgent));
        }
    }

    fn handler_with_task(dir: &tempfile::TempDir) -> (Handler, Arc<RecordingSink>, Task) {
        let store = Arc::new(FileStore::open(dir.path().join("tasks.bin")).unwrap());
        let task = Task::new("return library books", Utc::now() + Duration::hours(1));
        store.insert(task.clone()).unwrap();
        let sink = Arc::new(RecordingSink::default());
        let handler = Handler::new(store, Arc::clone(&sink) as Arc<dyn NotificationSink>);
        (handler, sink, task)
    }

    #[test]
    fn missed_frame_shows_an_urgent_toast() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, sink, task) = handler_with_task(&dir);

        let bytes = NotifierFn::ShowMissed.with_id(task.id).encode();
        assert!(handler.handle(&bytes).is_continue());

        let shown = sink.shown.lock().unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].0, "Missed: return library books");
        assert!(shown[0].2, "missed toasts are urgent");
    }

    #[test]
    fn due_soon_frame_shows_a_normal_toast() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, sink, task) = handler_with_task(&dir);

        let bytes = NotifierFn::ShowDueSoon.with_id(task.id).encode();
        assert!(handler.handle(&bytes).is_continue());

        let shown = sink.shown.lock().unwrap();
        assert_eq!(shown[0].0, "Due soon: return library books");
        assert!(!shown[0].2);
    }

    #[test]
    fn goodbye_frame_stops_the_process() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, sink, _task) = handler_with_task(&dir);

        let bytes = NotifierFn::ConnectionClosed.bare().encode();
        assert!(handler.handle(&bytes).is_break());
        assert!(sink.shown.lock().unwrap().is_empty());
    }

    #[test]
    fn foreign_and_malformed_frames_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let (handler, sink, task) = handler_with_task(&dir);

        // Addressed to the UI, wrong length, unknown record.
        assert!(handler
            .handle(&UiFn::MarkMissed.with_id(task.id).encode())
            .is_continue());
        assert!(handler.handle(&[2, 1, 0]).is_continue());
        let unknown = NotifierFn::ShowMissed
            .with_id(tempo_core::RecordId::new())
            .encode();
        assert!(handler.handle(&unknown).is_continue());

        assert!(sink.shown.lock().unwrap().is_empty());
    }
}
