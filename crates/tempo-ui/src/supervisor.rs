//! Connection supervisor. Owns the pipe connection to the scheduler and the
//! policy around it: launch the daemon when the socket is unreachable,
//! reconnect once after a drop, give up cleanly otherwise.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::{info, warn};

use tempo_core::TempoConfig;
use tempo_pipe::{PipeClient, PipeEvent};
use tempo_protocol::{Endpoint, Frame, UiFn};

use crate::launch;
use crate::pidfile::DaemonPidFile;
use crate::requests::TaskRequests;
use crate::view::ViewSink;

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// How one pipe session ended.
enum SessionEnd {
    /// The server said goodbye or the pipe broke; a reconnect may help.
    Lost,
}

/// Called once per established session with the outbound request handle,
/// so the editor layer can wire its buttons to the live connection.
pub type SessionHook = Box<dyn Fn(TaskRequests) + Send + Sync>;

pub struct Supervisor {
    config: TempoConfig,
    view: Arc<dyn ViewSink>,
    pids: DaemonPidFile,
    on_session: SessionHook,
}

impl Supervisor {
    pub fn new(config: TempoConfig, view: Arc<dyn ViewSink>, on_session: SessionHook) -> Result<Self> {
        let pids = DaemonPidFile::new(config.socket_dir.clone())?;
        Ok(Self {
            config,
            view,
            pids,
            on_session,
        })
    }

    /// Run until the daemon is gone for good. Errors mean the daemon could
    /// not be reached even after the launch chain.
    pub async fn run(&self) -> Result<()> {
        let (client, events) = self.connect_or_revive().await?;
        let mut session = (client, events);

        loop {
            let (client, events) = session;
            (self.on_session)(TaskRequests::new(Arc::clone(&client)));

            let SessionEnd::Lost = self.serve(events).await;
            drop(client);

            info!(delay = ?RECONNECT_DELAY, "connection lost, reconnecting");
            tokio::time::sleep(RECONNECT_DELAY).await;
            match self.connect().await {
                Ok(fresh) => session = fresh,
                Err(e) => {
                    info!("reconnect failed ({e}), shutting down");
                    return Ok(());
                }
            }
        }
    }

    /// First contact: when the socket is unreachable, run the launch chain
    /// and retry exactly once.
    async fn connect_or_revive(&self) -> Result<(Arc<PipeClient>, mpsc::Receiver<PipeEvent>)> {
        match self.connect().await {
            Ok(session) => return Ok(session),
            Err(e) => warn!("daemon unreachable ({e}), running the launch chain"),
        }

        match launch::revive_daemon(&self.config, &self.pids) {
            Some(method) => info!(?method, "daemon launch attempted"),
            None => warn!("every launch method failed"),
        }
        // Give a freshly launched daemon a moment to bind its sockets.
        tokio::time::sleep(Duration::from_millis(500)).await;

        match self.connect().await {
            Ok(session) => Ok(session),
            Err(e) => bail!("scheduler daemon unreachable after launch chain: {e}"),
        }
    }

    async fn connect(&self) -> tempo_pipe::Result<(Arc<PipeClient>, mpsc::Receiver<PipeEvent>)> {
        let (client, events) = PipeClient::connect(
            self.config.ui_socket_path(),
            Duration::from_millis(self.config.connect_timeout_ms),
            self.config.buffer_size,
        )
        .await?;
        Ok((Arc::new(client), events))
    }

    /// Dispatch server frames into the view until the session dies.
    async fn serve(&self, mut events: mpsc::Receiver<PipeEvent>) -> SessionEnd {
        while let Some(event) = events.recv().await {
            match event {
                PipeEvent::Data(bytes) => {
                    if self.dispatch(&bytes).is_break() {
                        return SessionEnd::Lost;
                    }
                }
                PipeEvent::Disconnected => return SessionEnd::Lost,
                PipeEvent::Connected => {}
            }
        }
        SessionEnd::Lost
    }

    fn dispatch(&self, bytes: &[u8]) -> std::ops::ControlFlow<()> {
        // A single read may hold several coalesced frames.
        let frames = match Frame::decode_all(bytes, Endpoint::Ui) {
            Ok(frames) => frames,
            Err(e) => {
                warn!("dropping invalid read: {e}");
                return std::ops::ControlFlow::Continue(());
            }
        };
        for frame in frames {
            match UiFn::try_from(frame.function) {
                Ok(UiFn::ReloadView) => self.view.reload(),
                Ok(UiFn::MarkMissed) => match frame.require_id() {
                    Ok(id) => self.view.mark_missed(id),
                    Err(e) => warn!("dropping frame: {e}"),
                },
                Ok(UiFn::ConnectionClosed) => {
                    self.view.connection_closed();
                    return std::ops::ControlFlow::Break(());
                }
                Err(e) => warn!("dropping frame: {e}"),
            }
        }
        std::ops::ControlFlow::Continue(())
    }
}
