use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

mod handler;
mod sink;

use tempo_core::{Task, TempoConfig};
use tempo_pipe::{PipeClient, PipeEvent};
use tempo_store::FileStore;

/// Notification process: listens on its pipe slot and turns scheduler
/// announcements into desktop toasts.
#[derive(Debug, Parser)]
#[command(name = "tempo-notifier", version)]
struct Args {
    /// Config file path (default: ~/.tempo/tempo.toml).
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tempo_notifier=info,tempo_pipe=info".into()),
        )
        .init();

    let config = TempoConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        TempoConfig::default()
    });

    let store = Arc::new(FileStore::<Task>::open(config.data_dir.join("tasks.bin"))?);
    let handler = handler::Handler::new(store, Arc::new(sink::NotifySend));

    let (_client, mut events) = PipeClient::connect(
        config.notifier_socket_path(),
        Duration::from_millis(config.connect_timeout_ms),
        config.buffer_size,
    )
    .await?;
    info!("notifier attached to the scheduler");

    while let Some(event) = events.recv().await {
        match event {
            PipeEvent::Data(bytes) => {
                if handler.handle(&bytes).is_break() {
                    break;
                }
            }
            PipeEvent::Disconnected => {
                info!("scheduler connection broke, exiting");
                break;
            }
            PipeEvent::Connected => {}
        }
    }

    info!("tempo notifier stopped");
    Ok(())
}
