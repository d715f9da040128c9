use crate::domains::agents::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One tracked pseudo-terminal tab and everything derived about it.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    /// Best-known cwd of the foreground process; lags reality between polls.
    pub cwd: PathBuf,
    /// Short name of the foreground program, empty when unknown.
    pub program: String,
    pub label: String,
    /// A user-set label is never replaced by auto-derived text.
    pub label_is_custom: bool,
    /// Most recent committed prompt line, truncated for display.
    pub latest_input: String,
    pub agent: Option<AgentKind>,
    pub log_id: Option<String>,
    /// Parent log named by an explicit resume. Continuation logs created by a
    /// resume are often not independently resumable, so the parent stays the
    /// durable anchor.
    pub resume_parent_log_id: Option<String>,
    /// Not-yet-committed keystrokes of the current input line.
    pub input_buffer: String,
    /// Bounded tail of raw output, cleared on foreground program change.
    pub tail: String,
    /// Incomplete trailing UTF-8 sequence from the last output chunk.
    pub pending_output: Vec<u8>,
    pub last_output_at: Option<DateTime<Utc>>,
    pub last_input_at: Option<DateTime<Utc>>,
    /// Bumped whenever the foreground program leaves the agent; log-watch
    /// results stamped with an older epoch are discarded.
    pub agent_epoch: u64,
    /// While set, task sentinels in output are stripped without emitting
    /// events (a resume replays prior output verbatim).
    pub task_cooldown_until: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(id: String, cwd: PathBuf) -> Self {
        Self {
            id,
            cwd,
            program: String::new(),
            label: String::new(),
            label_is_custom: false,
            latest_input: String::new(),
            agent: None,
            log_id: None,
            resume_parent_log_id: None,
            input_buffer: String::new(),
            tail: String::new(),
            pending_output: Vec::new(),
            last_output_at: None,
            last_input_at: None,
            agent_epoch: 0,
            task_cooldown_until: None,
        }
    }
}

/// Per-session summary handed to the UI by `list_info`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub id: String,
    pub cwd: String,
    pub program: String,
    pub label: String,
    pub latest_input: String,
    pub log_id: Option<String>,
    /// Derived "what is happening" line for display.
    pub last_output: String,
    /// True when output arrived within the recent activity window.
    pub active: bool,
    pub last_input_at: Option<i64>,
    pub is_thinking: bool,
    pub agent: Option<AgentKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleInfo {
    pub label: String,
    pub detail: String,
}

/// History of recently closed sessions that had a resumable conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedSessionEntry {
    pub label: String,
    pub cwd: PathBuf,
    pub log_id: String,
    pub agent: AgentKind,
    pub closed_at: DateTime<Utc>,
}

/// On-disk projection of one tab. Field names match the historical session
/// file so existing installs restore cleanly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedTab {
    pub issue: String,
    pub cwd: PathBuf,
    #[serde(rename = "hadClaude", default)]
    pub had_claude: bool,
    #[serde(rename = "hadGemini", default)]
    pub had_gemini: bool,
    #[serde(rename = "claudeSessionId", default)]
    pub claude_session_id: Option<String>,
}

impl SavedTab {
    pub fn agent(&self) -> Option<AgentKind> {
        if self.had_claude {
            Some(AgentKind::Claude)
        } else if self.had_gemini {
            Some(AgentKind::Gemini)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSession {
    pub tabs: Vec<SavedTab>,
    pub active_index: usize,
}

/// Pre-seeded agent association for a freshly created session, used on
/// restore so an early shutdown still persists a resumable entry.
#[derive(Debug, Clone)]
pub struct ResumeHint {
    pub agent: AgentKind,
    pub log_id: Option<String>,
}
