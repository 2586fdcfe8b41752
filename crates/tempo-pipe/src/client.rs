use std::path::Path;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::UnixStream;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use crate::error::{PipeError, Result};
use crate::PipeEvent;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Client end of a slot. One stream for the process lifetime of the
/// connection; when the server goes away the event channel yields
/// `Disconnected` and the client is spent.
pub struct PipeClient {
    writer: Mutex<OwnedWriteHalf>,
}

impl PipeClient {
    /// Connect to a slot, bounded by `timeout`.
    pub async fn connect(
        path: impl AsRef<Path>,
        timeout: Duration,
        buffer_size: usize,
    ) -> Result<(Self, mpsc::Receiver<PipeEvent>)> {
        let path = path.as_ref();
        let stream = tokio::time::timeout(timeout, UnixStream::connect(path))
            .await
            .map_err(|_| PipeError::ConnectTimeout(timeout.as_millis() as u64))??;
        info!(path = %path.display(), "connected to pipe slot");

        let (mut read_half, write_half) = stream.into_split();
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut buf = vec![0u8; buffer_size];
            loop {
                match read_half.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        if event_tx.send(PipeEvent::Data(buf[..n].to_vec())).await.is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        warn!("read failed: {e}");
                        break;
                    }
                }
            }
            let _ = event_tx.send(PipeEvent::Disconnected).await;
        });

        Ok((
            Self {
                writer: Mutex::new(write_half),
            },
            event_rx,
        ))
    }

    pub async fn send(&self, bytes: &[u8]) -> Result<()> {
        let mut write_half = self.writer.lock().await;
        write_half.write_all(bytes).await?;
        write_half.flush().await?;
        Ok(())
    }
}
