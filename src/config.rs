use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tunable constants for the session registry.
///
/// The timing values (poll cadence, watch cadence, restore stagger) are
/// empirically tuned rather than load-bearing correctness guarantees, so they
/// live here instead of being hardcoded at the call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistryConfig {
    /// Cadence of the foreground-program/cwd probe per session.
    pub poll_interval_ms: u64,
    /// Delay before the first probe after spawning a PTY.
    pub initial_probe_delay_ms: u64,
    /// Cadence of the conversation-log directory watch.
    pub watch_interval_ms: u64,
    /// A watch that finds no new log file within this window self-cancels.
    pub watch_timeout_ms: u64,
    /// Window after an explicit resume during which task sentinels are
    /// suppressed (resume replays prior output verbatim).
    pub resume_cooldown_ms: u64,
    /// Base delay before replaying the first resume command on restore.
    pub restore_stagger_base_ms: u64,
    /// Additional delay per restored tab. Staggering keeps one tab's new-log
    /// detection from attributing another tab's log file to itself.
    pub restore_stagger_step_ms: u64,
    /// A session counts as active when output arrived within this window.
    pub active_window_ms: u64,
    /// Size of the per-session raw output tail kept for heuristics.
    pub tail_buffer_chars: usize,
    /// Captured prompt lines are truncated to this many characters.
    pub input_summary_max_chars: usize,
    /// Length of the one-line synopsis pulled from a conversation log.
    pub synopsis_max_chars: usize,
    /// How much of the end of an unbounded log file is read for the synopsis.
    pub synopsis_tail_bytes: u64,
    pub max_saved_tabs: usize,
    pub max_closed_entries: usize,
    pub default_cols: u16,
    pub default_rows: u16,
    /// Override for the persisted session file (defaults under config dir).
    pub session_file: Option<PathBuf>,
    /// Override for the Claude home directory (defaults to ~/.claude).
    pub claude_home: Option<PathBuf>,
    /// Override for the Gemini home directory (defaults to ~/.gemini).
    pub gemini_home: Option<PathBuf>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1500,
            initial_probe_delay_ms: 500,
            watch_interval_ms: 1000,
            watch_timeout_ms: 60_000,
            resume_cooldown_ms: 30_000,
            restore_stagger_base_ms: 1000,
            restore_stagger_step_ms: 1500,
            active_window_ms: 3000,
            tail_buffer_chars: 3000,
            input_summary_max_chars: 50,
            synopsis_max_chars: 120,
            synopsis_tail_bytes: 5000,
            max_saved_tabs: 15,
            max_closed_entries: 10,
            default_cols: 80,
            default_rows: 24,
            session_file: None,
            claude_home: None,
            gemini_home: None,
        }
    }
}

impl RegistryConfig {
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// Best-effort load from the default config location. A missing or
    /// malformed file yields the defaults.
    pub fn load() -> Self {
        let Some(path) = Self::default_config_path() else {
            return Self::default();
        };
        match Self::load_from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                if path.exists() {
                    log::warn!("Ignoring malformed config at {}: {err}", path.display());
                }
                Self::default()
            }
        }
    }

    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("cockpit").join("config.toml"))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn initial_probe_delay(&self) -> Duration {
        Duration::from_millis(self.initial_probe_delay_ms)
    }

    pub fn watch_interval(&self) -> Duration {
        Duration::from_millis(self.watch_interval_ms)
    }

    pub fn watch_timeout(&self) -> Duration {
        Duration::from_millis(self.watch_timeout_ms)
    }

    /// Delay before replaying the resume command for the i-th restored tab.
    pub fn restore_stagger_delay(&self, index: usize) -> Duration {
        Duration::from_millis(
            self.restore_stagger_base_ms + self.restore_stagger_step_ms * index as u64,
        )
    }
}
