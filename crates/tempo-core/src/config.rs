use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

// Pipe endpoints — socket file names under `socket_dir`. The daemon owns
// both; the UI and notifier each connect to their own.
pub const UI_SOCKET: &str = "tempo.ui.sock";
pub const NOTIFIER_SOCKET: &str = "tempo.notifier.sock";

pub const DEFAULT_BUFFER_SIZE: usize = 1024;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;

/// Top-level config (tempo.toml + TEMPO_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempoConfig {
    /// Directory holding the per-type record containers.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Directory holding the pipe sockets.
    #[serde(default = "default_socket_dir")]
    pub socket_dir: PathBuf,
    /// Transport read-buffer size in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Client connect timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Scheduler executable name, resolved beside the current binary when the
    /// supervisor has to launch it directly.
    #[serde(default = "default_daemon_exe")]
    pub daemon_exe: String,
    /// Notifier executable name, launched by the daemon.
    #[serde(default = "default_notifier_exe")]
    pub notifier_exe: String,
}

impl Default for TempoConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            socket_dir: default_socket_dir(),
            buffer_size: default_buffer_size(),
            connect_timeout_ms: default_connect_timeout_ms(),
            daemon_exe: default_daemon_exe(),
            notifier_exe: default_notifier_exe(),
        }
    }
}

impl TempoConfig {
    /// Load config from a TOML file with TEMPO_* env var overrides.
    ///
    /// Checks in order: explicit path argument, then `~/.tempo/tempo.toml`.
    /// A missing file yields the defaults; a malformed one is an error.
    pub fn load(config_path: Option<&str>) -> crate::Result<Self> {
        let path = config_path
            .map(PathBuf::from)
            .unwrap_or_else(|| home_dir().join(".tempo").join("tempo.toml"));

        let config: TempoConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("TEMPO_"))
            .extract()
            .map_err(|e| crate::CoreError::Config(e.to_string()))?;

        Ok(config)
    }

    pub fn ui_socket_path(&self) -> PathBuf {
        self.socket_dir.join(UI_SOCKET)
    }

    pub fn notifier_socket_path(&self) -> PathBuf {
        self.socket_dir.join(NOTIFIER_SOCKET)
    }
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

fn default_data_dir() -> PathBuf {
    home_dir().join(".tempo").join("data")
}

fn default_socket_dir() -> PathBuf {
    home_dir().join(".tempo").join("run")
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_daemon_exe() -> String {
    "tempo-daemon".to_string()
}

fn default_notifier_exe() -> String {
    "tempo-notifier".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_every_field() {
        let config = TempoConfig::default();
        assert_eq!(config.buffer_size, DEFAULT_BUFFER_SIZE);
        assert_eq!(config.connect_timeout_ms, DEFAULT_CONNECT_TIMEOUT_MS);
        assert!(config.ui_socket_path().ends_with(UI_SOCKET));
        assert!(config.notifier_socket_path().ends_with(NOTIFIER_SOCKET));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let config = TempoConfig::load(Some("/nonexistent/tempo.toml")).unwrap();
        assert_eq!(config.daemon_exe, "tempo-daemon");
    }
}
