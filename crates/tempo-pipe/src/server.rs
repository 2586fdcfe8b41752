use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixListener;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use crate::error::{PipeError, Result};
use crate::PipeEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;
const ACCEPT_RETRY: std::time::Duration = std::time::Duration::from_secs(1);

/// One server-side slot: a bound socket that serves a single peer at a time.
pub struct PipeServer {
    path: PathBuf,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    shutdown: watch::Sender<bool>,
}

impl PipeServer {
    /// Bind the slot and start accepting. A stale socket file from a
    /// previous run is removed first. Returns the slot handle plus the
    /// event stream its consumer drains.
    pub fn bind(
        path: impl AsRef<Path>,
        buffer_size: usize,
    ) -> Result<(Self, mpsc::Receiver<PipeEvent>)> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        let listener = UnixListener::bind(&path)?;
        info!(path = %path.display(), "pipe slot bound");

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let writer = Arc::new(Mutex::new(None));

        tokio::spawn(accept_loop(
            listener,
            Arc::clone(&writer),
            event_tx,
            shutdown_rx,
            buffer_size,
        ));

        Ok((
            Self {
                path,
                writer,
                shutdown: shutdown_tx,
            },
            event_rx,
        ))
    }

    /// Write a message to the attached peer. Fails fast when the slot is
    /// empty; senders treat that the same as a mid-write error.
    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut guard = self.writer.lock().await;
        match guard.as_mut() {
            Some(write_half) => {
                write_half.write_all(bytes).await?;
                write_half.flush().await?;
                Ok(())
            }
            None => Err(PipeError::NotConnected),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.writer.lock().await.is_some()
    }

    /// Stop accepting and reading. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

impl Drop for PipeServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(true);
        let _ = std::fs::remove_file(&self.path);
    }
}

async fn accept_loop(
    listener: UnixListener,
    writer: Arc<Mutex<Option<OwnedWriteHalf>>>,
    event_tx: mpsc::Sender<PipeEvent>,
    mut shutdown: watch::Receiver<bool>,
    buffer_size: usize,
) {
    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let (read_half, write_half) = stream.into_split();
                    *writer.lock().await = Some(write_half);
                    debug!("peer attached");
                    if event_tx.send(PipeEvent::Connected).await.is_err() {
                        break;
                    }

                    read_until_gone(read_half, buffer_size, &event_tx, &mut shutdown).await;

                    *writer.lock().await = None;
                    debug!("peer detached");
                    if event_tx.send(PipeEvent::Disconnected).await.is_err() {
                        break;
                    }
                    // The read may have ended because of shutdown, not the peer.
                    if *shutdown.borrow() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("accept failed: {e}");
                    tokio::time::sleep(ACCEPT_RETRY).await;
                }
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    break;
                }
            }
        }
    }
}

/// Drain the peer until it closes (zero-length read), errors, or we shut
/// down. Each successful read becomes one `Data` event.
async fn read_until_gone(
    mut read_half: OwnedReadHalf,
    buffer_size: usize,
    event_tx: &mpsc::Sender<PipeEvent>,
    shutdown: &mut watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; buffer_size];
    loop {
        tokio::select! {
            read = read_half.read(&mut buf) => match read {
                Ok(0) => return,
                Ok(n) => {
                    if event_tx.send(PipeEvent::Data(buf[..n].to_vec())).await.is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("read failed: {e}");
                    return;
                }
            },
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
        }
    }
}
