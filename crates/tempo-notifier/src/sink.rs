//! Toast rendering seam. The bundled implementation shells out to
//! `notify-send`; desktop-specific visuals stay outside this crate.

use std::process::Command;

use tracing::warn;

pub trait NotificationSink: Send + Sync {
    /// Show one toast. `urgent` maps to the platform's critical level.
    fn notify(&self, summary: &str, body: &str, urgent: bool);
}

pub struct NotifySend;

impl NotificationSink for NotifySend {
    fn notify(&self, summary: &str, body: &str, urgent: bool) {
        let urgency = if urgent { "critical" } else { "normal" };
        let result = Command::new("notify-send")
            .args(["--app-name", "Tempo", "--urgency", urgency])
            .arg(summary)
            .arg(body)
            .status();
        match result {
            Ok(status) if status.success() => {}
            Ok(status) => warn!(%status, "notify-send reported failure"),
            Err(e) => warn!("notify-send not usable: {e}"),
        }
    }
}
