//! Pid bookkeeping for daemons this process spawned itself. The supervisor
//! only ever kills a pid it previously recorded here — a daemon started by
//! the session manager or by hand is never touched.

use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tracing::{info, warn};

const TERM_GRACE: Duration = Duration::from_secs(2);

pub struct DaemonPidFile {
    path: PathBuf,
}

impl DaemonPidFile {
    pub fn new(run_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&run_dir)
            .with_context(|| format!("Failed to create directory: {}", run_dir.display()))?;
        Ok(Self {
            path: run_dir.join("tempo-daemon.pid"),
        })
    }

    /// Remember a daemon pid we just spawned.
    pub fn record(&self, pid: u32) -> Result<()> {
        fs::write(&self.path, pid.to_string())
            .with_context(|| format!("Failed to write pid file: {}", self.path.display()))?;
        info!(pid, path = %self.path.display(), "daemon pid recorded");
        Ok(())
    }

    pub fn read(&self) -> Option<u32> {
        fs::read_to_string(&self.path)
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
    }

    pub fn clear(&self) {
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }

    /// Tear down a stray daemon recorded earlier: SIGTERM, a short grace
    /// period, then SIGKILL. A stale entry (process already gone) is simply
    /// cleared. Returns whether a live process was actually stopped.
    pub fn stop_recorded(&self) -> bool {
        let Some(pid) = self.read() else {
            return false;
        };
        if !process_exists(pid) {
            info!(pid, "recorded daemon already gone, clearing stale pid file");
            self.clear();
            return false;
        }

        info!(pid, "stopping stray daemon");
        if kill(Pid::from_raw(pid as i32), Signal::SIGTERM).is_err() {
            warn!(pid, "SIGTERM failed");
            return false;
        }

        let deadline = Instant::now() + TERM_GRACE;
        while Instant::now() < deadline {
            if !process_exists(pid) {
                self.clear();
                return true;
            }
            std::thread::sleep(Duration::from_millis(100));
        }

        warn!(pid, "daemon ignored SIGTERM, sending SIGKILL");
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
        self.clear();
        true
    }
}

/// Existence probe: null signal touches nothing.
fn process_exists(pid: u32) -> bool {
    kill(Pid::from_raw(pid as i32), None).is_ok()
}
