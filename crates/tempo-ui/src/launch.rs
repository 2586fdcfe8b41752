//! Fallback chain for bringing the scheduler daemon up when its socket is
//! unreachable: clean up a stray we spawned earlier, then try the installed
//! user service, then the desktop autostart entry, and as a last resort
//! spawn the executable sitting beside our own binary.

use std::path::PathBuf;
use std::process::Command;

use tracing::{info, warn};

use tempo_core::TempoConfig;

use crate::pidfile::DaemonPidFile;

const USER_SERVICE: &str = "tempo-daemon.service";

/// Which rung of the chain brought the daemon up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMethod {
    UserService,
    AutostartEntry,
    SiblingExecutable,
}

/// Run the whole chain once. `None` means every rung failed and the caller
/// should give up after its final connect attempt.
pub fn revive_daemon(config: &TempoConfig, pids: &DaemonPidFile) -> Option<LaunchMethod> {
    // A half-dead daemon we spawned earlier would hold the socket hostage.
    pids.stop_recorded();

    if start_user_service() {
        return Some(LaunchMethod::UserService);
    }
    if start_autostart_entry() {
        return Some(LaunchMethod::AutostartEntry);
    }
    if spawn_sibling(config, pids) {
        return Some(LaunchMethod::SiblingExecutable);
    }
    None
}

fn start_user_service() -> bool {
    match Command::new("systemctl")
        .args(["--user", "start", USER_SERVICE])
        .status()
    {
        Ok(status) if status.success() => {
            info!(service = USER_SERVICE, "daemon started via user service");
            true
        }
        Ok(status) => {
            info!(service = USER_SERVICE, %status, "user service not available");
            false
        }
        Err(e) => {
            info!("systemctl not usable: {e}");
            false
        }
    }
}

/// Parse the `Exec=` line of our autostart entry and run it, the same way
/// the session manager would at login.
fn start_autostart_entry() -> bool {
    let Some(entry) = autostart_entry_path() else {
        return false;
    };
    let Ok(contents) = std::fs::read_to_string(&entry) else {
        return false;
    };
    let Some(exec) = contents
        .lines()
        .find_map(|line| line.strip_prefix("Exec="))
        .map(str::trim)
    else {
        warn!(path = %entry.display(), "autostart entry has no Exec line");
        return false;
    };

    let mut parts = exec.split_whitespace();
    let Some(program) = parts.next() else {
        return false;
    };
    match Command::new(program).args(parts).spawn() {
        Ok(child) => {
            info!(pid = child.id(), path = %entry.display(), "daemon started via autostart entry");
            true
        }
        Err(e) => {
            warn!(exec, "autostart launch failed: {e}");
            false
        }
    }
}

fn autostart_entry_path() -> Option<PathBuf> {
    let path = dirs::config_dir()?
        .join("autostart")
        .join("tempo-daemon.desktop");
    path.exists().then_some(path)
}

/// Spawn the daemon executable next to the current binary and record its
/// pid so a later chain run may reap it.
fn spawn_sibling(config: &TempoConfig, pids: &DaemonPidFile) -> bool {
    let exe = std::env::current_exe()
        .ok()
        .and_then(|path| path.parent().map(|dir| dir.join(&config.daemon_exe)));
    let Some(exe) = exe else {
        warn!("cannot resolve the daemon executable path");
        return false;
    };

    match Command::new(&exe).arg("--autostart").spawn() {
        Ok(child) => {
            info!(pid = child.id(), exe = %exe.display(), "daemon spawned directly");
            if let Err(e) = pids.record(child.id()) {
                warn!("pid not recorded: {e}");
            }
            true
        }
        Err(e) => {
            warn!(exe = %exe.display(), "daemon spawn failed: {e}");
            false
        }
    }
}
