pub mod claude;
pub mod gemini;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Supported coding-agent CLI families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    Claude,
    Gemini,
}

impl AgentKind {
    pub fn command_name(&self) -> &'static str {
        match self {
            AgentKind::Claude => "claude",
            AgentKind::Gemini => "gemini",
        }
    }
}

/// Program names that count as "the shell itself" rather than a foreground
/// application.
pub const SHELL_NAMES: &[&str] = &["zsh", "bash", "fish", "sh", "login"];

pub fn is_shell(program: &str) -> bool {
    SHELL_NAMES.contains(&program)
}

/// Result of matching a committed shell command against agent launch forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDetection {
    pub kind: AgentKind,
    /// Log id named by an explicit `--resume <id>` / `-r <id>` flag.
    pub resume_log_id: Option<String>,
}

/// Match a committed shell command line against the known agent launch forms:
/// a bare invocation (`claude`, `gemini`), optionally path-prefixed
/// (`/usr/local/bin/claude`), with or without a resume flag.
pub fn detect_agent_launch(command: &str) -> Option<LaunchDetection> {
    let tokens = shell_words::split(command.trim()).ok()?;
    let first = tokens.first()?;

    let kind = if first == "claude" || first.ends_with("/claude") {
        AgentKind::Claude
    } else if first == "gemini" || first.ends_with("/gemini") {
        AgentKind::Gemini
    } else {
        return None;
    };

    let mut resume_log_id = None;
    let mut args = tokens[1..].iter();
    while let Some(arg) = args.next() {
        if arg == "--resume" || arg == "-r" {
            resume_log_id = args.next().cloned();
            break;
        }
        if let Some(id) = arg.strip_prefix("--resume=") {
            resume_log_id = Some(id.to_string());
            break;
        }
    }
    resume_log_id = resume_log_id.filter(|id| !id.is_empty());

    Some(LaunchDetection { kind, resume_log_id })
}

/// One discovered conversation-log file.
#[derive(Debug, Clone)]
pub struct LogFileInfo {
    /// Derived identifier (file stem for Claude, embedded sessionId for
    /// Gemini when present).
    pub id: String,
    pub path: PathBuf,
    pub modified: SystemTime,
}

/// Directory holding the agent's conversation logs for a working directory.
pub fn log_dir_for(kind: AgentKind, agent_home: &Path, cwd: &Path) -> PathBuf {
    match kind {
        AgentKind::Claude => claude::project_log_dir(agent_home, cwd),
        AgentKind::Gemini => gemini::chats_dir(agent_home, cwd),
    }
}

/// Candidate log files sorted by modification time, most recent first.
pub fn list_recent(kind: AgentKind, log_dir: &Path) -> Vec<LogFileInfo> {
    let mut files = match kind {
        AgentKind::Claude => claude::list_logs(log_dir),
        AgentKind::Gemini => gemini::list_logs(log_dir),
    };
    files.sort_by(|a, b| b.modified.cmp(&a.modified));
    files
}

/// Whether the named log holds at least one real conversational turn. Used to
/// avoid persisting or resuming an empty, not-yet-flushed log.
pub fn has_conversation_content(kind: AgentKind, log_dir: &Path, log_id: &str) -> bool {
    match kind {
        AgentKind::Claude => claude::has_conversation_content(log_dir, log_id),
        AgentKind::Gemini => gemini::has_conversation_content(log_dir, log_id),
    }
}

/// One-line display synopsis from the end of the log, or None.
pub fn last_response_synopsis(
    kind: AgentKind,
    log_dir: &Path,
    log_id: &str,
    max_chars: usize,
    tail_bytes: u64,
) -> Option<String> {
    match kind {
        AgentKind::Claude => claude::last_response_synopsis(log_dir, log_id, max_chars, tail_bytes),
        AgentKind::Gemini => gemini::last_response_synopsis(log_dir, log_id, max_chars),
    }
}

pub(crate) fn collapse_whitespace(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() > max_chars {
        let head: String = collapsed.chars().take(max_chars).collect();
        format!("{head}…")
    } else {
        collapsed
    }
}
