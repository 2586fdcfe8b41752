use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

mod bridge;
mod notifier_proc;
mod renovation;

use tempo_core::{Task, TempoConfig};
use tempo_monitor::{MonitorEvent, TimeMonitor};
use tempo_pipe::PipeServer;
use tempo_store::{FileStore, StoreAdapter};

/// Scheduler daemon: watches task deadlines and drives the UI and notifier
/// processes over the pipe slots.
#[derive(Debug, Parser)]
#[command(name = "tempo-daemon", version)]
struct Args {
    /// Config file path (default: ~/.tempo/tempo.toml).
    #[arg(long)]
    config: Option<String>,

    /// Launched by the session manager at login: keep the console quiet and
    /// never let a background hiccup take the process down.
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.autostart {
        "tempo_daemon=warn"
    } else {
        "tempo_daemon=info,tempo_monitor=info,tempo_pipe=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    let config = TempoConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        TempoConfig::default()
    });
    std::fs::create_dir_all(&config.socket_dir)?;

    let store = Arc::new(FileStore::<Task>::open(config.data_dir.join("tasks.bin"))?);

    // Catch up on recurrences that slipped by while the machine was off,
    // before the monitor takes its first snapshot of the container.
    if let Err(e) = renovation::renovate(&store) {
        warn!("startup renovation failed: {e}");
    }

    // Fired-item channel: TimeMonitor → Bridge dispatch task.
    let (fired_tx, fired_rx) = tokio::sync::mpsc::channel::<MonitorEvent>(256);
    let monitor = TimeMonitor::new();
    monitor
        .prepare(Arc::new(StoreAdapter::new(Arc::clone(&store))), fired_tx)
        .await;

    let (ui, ui_rx) = PipeServer::bind(config.ui_socket_path(), config.buffer_size)?;
    let (notifier, notifier_rx) =
        PipeServer::bind(config.notifier_socket_path(), config.buffer_size)?;
    let ui = Arc::new(ui);
    let notifier = Arc::new(notifier);

    let mut notifier_child = notifier_proc::NotifierChild::launch(&config);

    let (bridge, resync_rx) = bridge::Bridge::new(
        monitor.clone(),
        Arc::clone(&store),
        Arc::clone(&ui),
        Arc::clone(&notifier),
    );
    bridge.register_daily_checker();
    monitor.start()?;
    info!("tempo daemon running");

    tokio::select! {
        _ = bridge.run(fired_rx, ui_rx, notifier_rx, resync_rx) => {
            warn!("bridge loop ended unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested");
        }
    }

    monitor.stop();
    let notifier_reached = bridge.notifier_connected().await;
    bridge.announce_shutdown().await;
    if !notifier_reached {
        // The polite frame had nobody to land on; reap the child directly.
        notifier_child.kill();
    }
    ui.shutdown();
    notifier.shutdown();
    info!("tempo daemon stopped");
    Ok(())
}
