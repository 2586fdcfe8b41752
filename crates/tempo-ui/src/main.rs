use std::sync::Arc;

use clap::Parser;
use tracing::warn;

mod launch;
mod pidfile;
mod requests;
mod supervisor;
mod view;

use tempo_core::{Task, TempoConfig};
use tempo_store::FileStore;

/// UI-side process: keeps a supervised connection to the scheduler daemon
/// and feeds server pushes into the view layer.
#[derive(Debug, Parser)]
#[command(name = "tempo-ui", version)]
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
                .unwrap_or_else(|_| "tempo_ui=info,tempo_pipe=info".into()),
        )
        .init();

    let config = TempoConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        TempoConfig::default()
    });

    let store = Arc::new(FileStore::<Task>::open(config.data_dir.join("tasks.bin"))?);
    let view = Arc::new(view::LogSink::new(store));

    // Headless build: no editor layer claims the outbound handle yet.
    let supervisor = supervisor::Supervisor::new(config, view, Box::new(|_requests| {}))?;
    supervisor.run().await
}
