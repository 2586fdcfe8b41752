//! Glue between the time monitor and the two pipe slots. Consumes fired
//! monitor events, fans them out onto the wire, and dispatches inbound
//! client requests back into the monitor. Also owns the midnight resync.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use tempo_core::{dates, Task};
use tempo_monitor::{MonitorEvent, TimeMonitor};
use tempo_pipe::{PipeEvent, PipeServer};
use tempo_protocol::{fan_out, Endpoint, Frame, ServerFn, UiFn};
use tempo_store::FileStore;

use crate::renovation;

/// The daily checker re-arms itself once per day.
const CHECKER_REPEAT_HOURS: i64 = 24;

pub struct Bridge {
    monitor: TimeMonitor,
    store: Arc<FileStore<Task>>,
    ui: Arc<PipeServer>,
    notifier: Arc<PipeServer>,
    resync_tx: mpsc::UnboundedSender<()>,
}

impl Bridge {
    pub fn new(
        monitor: TimeMonitor,
        store: Arc<FileStore<Task>>,
        ui: Arc<PipeServer>,
        notifier: Arc<PipeServer>,
    ) -> (Self, mpsc::UnboundedReceiver<()>) {
        let (resync_tx, resync_rx) = mpsc::unbounded_channel();
        (
            Self {
                monitor,
                store,
                ui,
                notifier,
                resync_tx,
            },
            resync_rx,
        )
    }

    /// Arm the non-object item that wakes us at the next local midnight and
    /// then every 24 hours.
    pub fn register_daily_checker(&self) {
        let resync_tx = self.resync_tx.clone();
        self.monitor.register_non_object(
            dates::next_local_midnight(),
            Arc::new(move || {
                let _ = resync_tx.send(());
            }),
            CHECKER_REPEAT_HOURS,
        );
    }

    /// Main dispatch loop. Runs until every input channel is gone.
    pub async fn run(
        &self,
        mut fired_rx: mpsc::Receiver<MonitorEvent>,
        mut ui_rx: mpsc::Receiver<PipeEvent>,
        mut notifier_rx: mpsc::Receiver<PipeEvent>,
        mut resync_rx: mpsc::UnboundedReceiver<()>,
    ) {
        loop {
            tokio::select! {
                Some(event) = fired_rx.recv() => self.on_fired(event).await,
                Some(pipe_event) = ui_rx.recv() => self.on_pipe_event("ui", pipe_event).await,
                Some(pipe_event) = notifier_rx.recv() => self.on_pipe_event("notifier", pipe_event).await,
                Some(()) = resync_rx.recv() => self.resync().await,
                else => break,
            }
        }
    }

    /// Tell both clients the server is going away.
    pub async fn announce_shutdown(&self) {
        self.send(UiFn::ConnectionClosed.bare()).await;
        self.send(tempo_protocol::NotifierFn::ConnectionClosed.bare())
            .await;
    }

    /// Whether the notifier slot currently has a peer.
    pub async fn notifier_connected(&self) -> bool {
        self.notifier.is_connected().await
    }

    async fn on_fired(&self, event: MonitorEvent) {
        for frame in fan_out(&event) {
            self.send(frame).await;
        }
    }

    /// Fire-and-forget wire send; an empty slot or a broken write is the
    /// client's problem, not ours.
    async fn send(&self, frame: Frame) {
        let server = match frame.target {
            Endpoint::Ui => &self.ui,
            Endpoint::Notifier => &self.notifier,
            Endpoint::Server => {
                warn!("refusing to send a server-targeted frame");
                return;
            }
        };
        if let Err(e) = server.send(&frame.encode()).await {
            warn!(target = ?frame.target, "send failed: {e}");
        }
    }

    async fn on_pipe_event(&self, slot: &str, event: PipeEvent) {
        match event {
            PipeEvent::Connected => info!(slot, "client attached"),
            PipeEvent::Disconnected => info!(slot, "client detached"),
            PipeEvent::Data(bytes) => self.on_request(slot, &bytes).await,
        }
    }

    /// One socket read may carry several back-to-back frames when the client
    /// writes in a burst; dispatch each of them.
    async fn on_request(&self, slot: &str, bytes: &[u8]) {
        let frames = match Frame::decode_all(bytes, Endpoint::Server) {
            Ok(frames) => frames,
            Err(e) => {
                warn!(slot, "dropping invalid read: {e}");
                return;
            }
        };
        for frame in frames {
            let function = match ServerFn::try_from(frame.function) {
                Ok(function) => function,
                Err(e) => {
                    warn!(slot, "dropping request: {e}");
                    continue;
                }
            };
            let id = match frame.require_id() {
                Ok(id) => id,
                Err(e) => {
                    warn!(slot, "dropping request: {e}");
                    continue;
                }
            };

            match function {
                ServerFn::Cancel => {
                    self.monitor.remove_monitor(id, true);
                }
                ServerFn::Rebind => {
                    // Edited record: the old timing entry is stale. Drop it
                    // without a reload, then let the fresh dates compete.
                    self.monitor.remove_monitor(id, false);
                    self.monitor.try_add_one(id).await;
                }
                ServerFn::Ensure => {
                    self.monitor.try_add_one(id).await;
                }
            }
        }
    }

    /// Midnight pass: pause firing, renovate repeating tasks, rebuild the
    /// working set from the renewed container, and tell the UI to re-query.
    async fn resync(&self) {
        info!("daily resync started");
        self.monitor.stop();

        if let Err(e) = renovation::renovate(&self.store) {
            error!("renovation failed, continuing with the set rebuild: {e}");
        }

        self.monitor.clear_all();
        self.register_daily_checker();
        if let Err(e) = self.monitor.start() {
            error!("monitor restart failed: {e}");
        }
        self.monitor.refill().await;

        self.send(UiFn::ReloadView.bare()).await;
        info!("daily resync finished");
    }
}
