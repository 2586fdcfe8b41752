//! Lifecycle of the notifier child process. The daemon brings it up at
//! startup so toast delivery works without any user action, and tears it
//! down on exit only when the polite shutdown frame could not be delivered.

use std::process::{Child, Command};

use tracing::{info, warn};

use tempo_core::TempoConfig;

pub struct NotifierChild {
    child: Option<Child>,
}

impl NotifierChild {
    /// Spawn the notifier executable resolved beside the current binary.
    /// Failure is non-fatal: an externally started notifier can still
    /// connect to its slot.
    pub fn launch(config: &TempoConfig) -> Self {
        let exe = std::env::current_exe()
            .ok()
            .and_then(|path| path.parent().map(|dir| dir.join(&config.notifier_exe)));
        let Some(exe) = exe else {
            warn!("cannot resolve the notifier executable path");
            return Self { child: None };
        };

        match Command::new(&exe).spawn() {
            Ok(child) => {
                info!(pid = child.id(), exe = %exe.display(), "notifier launched");
                Self { child: Some(child) }
            }
            Err(e) => {
                warn!(exe = %exe.display(), "notifier launch failed: {e}");
                Self { child: None }
            }
        }
    }

    /// Force-stop the child we spawned. Used when the shutdown frame did not
    /// reach it; a notifier that got the frame exits on its own.
    pub fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!(pid = child.id(), "notifier kill failed: {e}");
            }
            let _ = child.wait();
        }
    }
}
