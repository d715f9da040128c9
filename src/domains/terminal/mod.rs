pub mod control_sequences;
pub mod proc_probe;

pub use control_sequences::strip_control_sequences;

use crate::errors::CockpitError;
use async_trait::async_trait;
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// Parameters for opening a new PTY running the user's login shell.
#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub cwd: PathBuf,
    pub cols: u16,
    pub rows: u16,
}

/// Point-in-time view of the process sitting in the PTY's foreground.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcSnapshot {
    /// Short program name (e.g. "zsh", "claude"). Empty means unknown.
    pub program: String,
    pub cwd: Option<PathBuf>,
}

/// Live handle to a spawned PTY. Writes and resizes are best-effort once the
/// child has exited.
pub trait PtyHandle: Send + Sync {
    fn pid(&self) -> Option<u32>;
    fn write(&self, data: &[u8]) -> Result<(), CockpitError>;
    fn resize(&self, cols: u16, rows: u16) -> Result<(), CockpitError>;
    fn kill(&self);
}

/// A freshly spawned PTY: the handle for input/control plus the raw output
/// stream drained by the registry's relay task.
pub struct SpawnedPty {
    pub handle: Arc<dyn PtyHandle>,
    pub output: mpsc::UnboundedReceiver<Vec<u8>>,
}

/// Seam between the registry and the operating system. The production
/// implementation spawns real shells through portable-pty; tests substitute a
/// scripted mock.
#[async_trait]
pub trait PtyBackend: Send + Sync {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnedPty, CockpitError>;

    /// Probe the foreground program and cwd of the process tree rooted at
    /// `pid`. None when the process is gone or the platform refuses.
    async fn probe(&self, pid: u32) -> Option<ProcSnapshot>;
}

/// Environment variables agents export into their children. A shell restored
/// inside one of our PTYs must not inherit them or a nested agent refuses to
/// start.
const AGENT_ENV_VARS: &[&str] = &["CLAUDECODE", "CLAUDE_CODE_ENTRYPOINT", "GEMINI_CLI"];

fn resolve_login_shell() -> String {
    if let Ok(shell) = std::env::var("SHELL")
        && !shell.is_empty()
    {
        return shell;
    }
    for candidate in ["zsh", "bash"] {
        if let Ok(path) = which::which(candidate) {
            return path.to_string_lossy().to_string();
        }
    }
    "/bin/sh".to_string()
}

struct PortablePtyHandle {
    pid: Option<u32>,
    writer: Mutex<Box<dyn Write + Send>>,
    master: Mutex<Box<dyn portable_pty::MasterPty + Send>>,
    child: Mutex<Box<dyn portable_pty::Child + Send + Sync>>,
}

impl PtyHandle for PortablePtyHandle {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn write(&self, data: &[u8]) -> Result<(), CockpitError> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| CockpitError::terminal("?", "write", "writer lock poisoned"))?;
        writer
            .write_all(data)
            .and_then(|()| writer.flush())
            .map_err(|err| CockpitError::terminal("?", "write", err.to_string()))
    }

    fn resize(&self, cols: u16, rows: u16) -> Result<(), CockpitError> {
        let master = self
            .master
            .lock()
            .map_err(|_| CockpitError::terminal("?", "resize", "master lock poisoned"))?;
        master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| CockpitError::terminal("?", "resize", err.to_string()))
    }

    fn kill(&self) {
        if let Ok(mut child) = self.child.lock()
            && let Err(err) = child.kill()
        {
            log::debug!("PTY child kill failed (already gone?): {err}");
        }
    }
}

/// Production backend over portable-pty.
pub struct PortablePtyBackend;

impl PortablePtyBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PortablePtyBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PtyBackend for PortablePtyBackend {
    async fn spawn(&self, request: SpawnRequest) -> Result<SpawnedPty, CockpitError> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: request.rows,
                cols: request.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|err| CockpitError::spawn(format!("openpty failed: {err}")))?;

        let shell = resolve_login_shell();
        log::info!(
            "Spawning login shell {shell} in {} ({}x{})",
            request.cwd.display(),
            request.cols,
            request.rows
        );

        let mut cmd = CommandBuilder::new(&shell);
        cmd.arg("-l");
        cmd.cwd(&request.cwd);
        // CommandBuilder starts with an empty env, so copy the parent's first.
        for (key, value) in std::env::vars() {
            cmd.env(key, value);
        }
        cmd.env("TERM", "xterm-256color");
        for var in AGENT_ENV_VARS {
            cmd.env_remove(var);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|err| CockpitError::spawn(format!("spawn {shell} failed: {err}")))?;
        let pid = child.process_id();

        let writer = pair
            .master
            .take_writer()
            .map_err(|err| CockpitError::spawn(format!("take_writer failed: {err}")))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|err| CockpitError::spawn(format!("clone reader failed: {err}")))?;

        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let mut reader = reader;
            let mut buf = [0u8; 4096];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        log::debug!("PTY read ended: {err}");
                        break;
                    }
                }
            }
        });

        let handle = Arc::new(PortablePtyHandle {
            pid,
            writer: Mutex::new(writer),
            master: Mutex::new(pair.master),
            child: Mutex::new(child),
        });

        Ok(SpawnedPty { handle, output: rx })
    }

    async fn probe(&self, pid: u32) -> Option<ProcSnapshot> {
        tokio::task::spawn_blocking(move || proc_probe::snapshot(pid))
            .await
            .ok()
            .flatten()
    }
}

/// Convenience used by probes and tests: last path component of a command.
pub fn program_name(command: &str) -> String {
    Path::new(command.trim())
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| command.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_name_takes_basename() {
        assert_eq!(program_name("/usr/local/bin/claude"), "claude");
        assert_eq!(program_name("zsh"), "zsh");
        assert_eq!(program_name("  bash "), "bash");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn spawn_produces_live_pty() {
        let backend = PortablePtyBackend::new();
        let dir = tempfile::tempdir().expect("tempdir");
        let spawned = backend
            .spawn(SpawnRequest {
                cwd: dir.path().to_path_buf(),
                cols: 80,
                rows: 24,
            })
            .await
            .expect("spawn");

        assert!(spawned.handle.pid().is_some());
        spawned.handle.write(b"exit\r").expect("write");
        spawned.handle.kill();
    }
}
