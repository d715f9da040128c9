use super::entity::{
    ClosedSessionEntry, ResumeHint, SavedSession, SavedTab, Session, SessionInfo, TitleInfo,
};
use super::keystrokes;
use super::persistence::SessionStore;
use crate::config::RegistryConfig;
use crate::domains::activity;
use crate::domains::agents::{self, AgentKind};
use crate::domains::terminal::{ProcSnapshot, PtyBackend, PtyHandle, SpawnRequest};
use crate::errors::CockpitError;
use crate::events::{CockpitEvent, EventEmitter};
use crate::shared::{get_home_dir, short_dir};
use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

const TASK_MARKER: &str = "[[TASK:";
const TASK_LIST_MARKER: &str = "[[TASKS:";

/// Everything owned per session besides the Session record itself. Dropped
/// atomically with the record on close so no timer can outlive its session.
struct SessionHandles {
    pty: Arc<dyn PtyHandle>,
    relay: JoinHandle<()>,
    poll: JoinHandle<()>,
    watch: Option<JoinHandle<()>>,
}

impl SessionHandles {
    fn abort_all(&self) {
        self.relay.abort();
        self.poll.abort();
        if let Some(watch) = &self.watch {
            watch.abort();
        }
    }
}

/// Single source of truth for all live sessions. All mutable state sits
/// behind the registry's own locks; spawned poll/relay/watch tasks re-read
/// state through these maps instead of closing over stale copies.
pub struct SessionRegistry {
    backend: Arc<dyn PtyBackend>,
    emitter: Arc<dyn EventEmitter>,
    config: RegistryConfig,
    store: SessionStore,
    sessions: RwLock<HashMap<String, Session>>,
    handles: RwLock<HashMap<String, SessionHandles>>,
    order: RwLock<Vec<String>>,
    closed: RwLock<Vec<ClosedSessionEntry>>,
    seen_tasks: RwLock<HashSet<String>>,
    counter: AtomicU64,
}

impl SessionRegistry {
    pub fn new(
        backend: Arc<dyn PtyBackend>,
        emitter: Arc<dyn EventEmitter>,
        config: RegistryConfig,
    ) -> Arc<Self> {
        let store = match &config.session_file {
            Some(path) => SessionStore::new(path.clone()),
            None => SessionStore::at_default_location(),
        };
        Arc::new(Self {
            backend,
            emitter,
            config,
            store,
            sessions: RwLock::new(HashMap::new()),
            handles: RwLock::new(HashMap::new()),
            order: RwLock::new(Vec::new()),
            closed: RwLock::new(Vec::new()),
            seen_tasks: RwLock::new(HashSet::new()),
            counter: AtomicU64::new(0),
        })
    }

    fn home(&self) -> PathBuf {
        get_home_dir().unwrap_or_else(std::env::temp_dir)
    }

    fn agent_home(&self, kind: AgentKind) -> PathBuf {
        match kind {
            AgentKind::Claude => self
                .config
                .claude_home
                .clone()
                .unwrap_or_else(|| self.home().join(".claude")),
            AgentKind::Gemini => self
                .config
                .gemini_home
                .clone()
                .unwrap_or_else(|| self.home().join(".gemini")),
        }
    }

    /// Spawn a new PTY session running a login shell. A resume hint marks the
    /// session as agent-associated immediately, so an early shutdown before
    /// the agent actually starts still persists a resumable entry.
    pub async fn create(
        self: &Arc<Self>,
        initial_dir: Option<PathBuf>,
        resume_hint: Option<ResumeHint>,
    ) -> Result<String, CockpitError> {
        let id = format!("tab-{}", self.counter.fetch_add(1, Ordering::SeqCst) + 1);
        let cwd = initial_dir.unwrap_or_else(|| self.home());

        let spawned = self
            .backend
            .spawn(SpawnRequest {
                cwd: cwd.clone(),
                cols: self.config.default_cols,
                rows: self.config.default_rows,
            })
            .await?;
        log::info!("Created session {id} in {}", cwd.display());

        let mut session = Session::new(id.clone(), cwd);
        if let Some(hint) = resume_hint {
            session.agent = Some(hint.agent);
            session.resume_parent_log_id = hint.log_id.clone();
            session.log_id = hint.log_id;
        }

        self.sessions.write().await.insert(id.clone(), session);
        self.order.write().await.push(id.clone());

        let relay = {
            let registry = Arc::clone(self);
            let id = id.clone();
            let mut output = spawned.output;
            tokio::spawn(async move {
                while let Some(chunk) = output.recv().await {
                    registry.handle_output(&id, &chunk).await;
                }
            })
        };

        let poll = {
            let registry = Arc::clone(self);
            let id = id.clone();
            let pid = spawned.handle.pid();
            tokio::spawn(async move {
                let Some(pid) = pid else {
                    return;
                };
                tokio::time::sleep(registry.config.initial_probe_delay()).await;
                loop {
                    if let Some(snapshot) = registry.backend.probe(pid).await {
                        registry.apply_probe(&id, snapshot).await;
                    }
                    tokio::time::sleep(registry.config.poll_interval()).await;
                }
            })
        };

        self.handles.write().await.insert(
            id.clone(),
            SessionHandles {
                pty: spawned.handle,
                relay,
                poll,
                watch: None,
            },
        );

        Ok(id)
    }

    /// Ingest one raw output chunk: decode it with multibyte carry-over,
    /// relay it, refresh the tail buffer, and mine it for task sentinels.
    pub(crate) async fn handle_output(&self, id: &str, data: &[u8]) {
        let (text, extracted) = {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(id) else {
                return;
            };
            let text = decode_output(&mut session.pending_output, data);
            session.last_output_at = Some(Utc::now());
            session.tail.push_str(&text);
            trim_to_last_chars(&mut session.tail, self.config.tail_buffer_chars);

            let suppress = session
                .task_cooldown_until
                .is_some_and(|until| Utc::now() < until);
            (text, extract_task_sentinels(&mut session.tail, suppress))
        };

        if !text.is_empty() {
            self.emitter.emit(CockpitEvent::TerminalOutput {
                session_id: id.to_string(),
                data: text,
            });
        }

        for found in extracted {
            match found {
                TaskSentinel::Task(title) => {
                    let key = title.trim().to_lowercase();
                    if self.seen_tasks.write().await.insert(key) {
                        self.emitter.emit(CockpitEvent::TaskDetected { title });
                    }
                }
                TaskSentinel::TaskList(tasks) => {
                    self.emitter.emit(CockpitEvent::TaskListReplaced { tasks });
                }
            }
        }
    }

    /// Fold one OS probe result into the session. Probe failures never reach
    /// here; stale values simply persist until the next successful poll.
    pub(crate) async fn apply_probe(&self, id: &str, snapshot: ProcSnapshot) {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(id) else {
            return;
        };

        let previous = session.program.clone();
        let current = snapshot.program;

        if current != previous {
            session.tail.clear();
            // Leaving the agent invalidates any in-flight log watch result.
            if let Some(kind) = session.agent
                && previous == kind.command_name()
                && current != kind.command_name()
            {
                session.agent_epoch += 1;
            }
            // Back at the shell prompt the last agent prompt is no longer
            // what the tab is doing.
            if !agents::is_shell(&previous) && agents::is_shell(&current) {
                session.latest_input.clear();
                session.input_buffer.clear();
            }
        }

        session.program = current;
        if let Some(cwd) = snapshot.cwd {
            session.cwd = cwd;
        }
    }

    /// Forward raw input to the PTY and mine it for committed commands. The
    /// terminal stays interactive no matter what the heuristics conclude;
    /// forwarding happens before any bookkeeping.
    pub async fn send_input(self: &Arc<Self>, id: &str, data: &[u8]) -> Result<(), CockpitError> {
        {
            let handles = self.handles.read().await;
            let Some(entry) = handles.get(id) else {
                return Ok(());
            };
            entry.pty.write(data)?;
        }

        let text = String::from_utf8_lossy(data).into_owned();
        let mut watch_request = None;

        {
            let mut sessions = self.sessions.write().await;
            let Some(session) = sessions.get_mut(id) else {
                return Ok(());
            };

            // New input marks a resume replay as over.
            session.task_cooldown_until = None;

            let committed = keystrokes::feed(&mut session.input_buffer, &text);
            for command in committed {
                if session.program.is_empty() || agents::is_shell(&session.program) {
                    let Some(detection) = agents::detect_agent_launch(&command) else {
                        continue;
                    };
                    log::info!(
                        "Session {id}: detected {} launch (resume: {:?})",
                        detection.kind.command_name(),
                        detection.resume_log_id
                    );
                    session.agent = Some(detection.kind);
                    if let Some(parent) = detection.resume_log_id {
                        session.resume_parent_log_id = Some(parent.clone());
                        session.log_id = Some(parent);
                        session.task_cooldown_until = Some(
                            Utc::now()
                                + ChronoDuration::milliseconds(
                                    self.config.resume_cooldown_ms as i64,
                                ),
                        );
                    }
                    watch_request =
                        Some((detection.kind, session.cwd.clone(), session.agent_epoch));
                } else {
                    let summary = truncate_chars(&command, self.config.input_summary_max_chars);
                    if session.label.is_empty() && !session.label_is_custom {
                        session.label = summary.clone();
                    }
                    session.latest_input = summary;
                    session.last_input_at = Some(Utc::now());
                }
            }
        }

        if let Some((kind, cwd, epoch)) = watch_request {
            self.start_log_watch(id.to_string(), kind, cwd, epoch).await;
        }
        Ok(())
    }

    /// Watch the agent's log directory for a file that did not exist when the
    /// agent was launched. At most one watch per session; a new launch
    /// replaces any outstanding one.
    async fn start_log_watch(self: &Arc<Self>, id: String, kind: AgentKind, cwd: PathBuf, epoch: u64) {
        let log_dir = agents::log_dir_for(kind, &self.agent_home(kind), &cwd);
        let existing: HashSet<PathBuf> = agents::list_recent(kind, &log_dir)
            .into_iter()
            .map(|file| file.path)
            .collect();
        let started_at = SystemTime::now();
        let deadline = Instant::now() + self.config.watch_timeout();

        let task = {
            let registry = Arc::clone(self);
            let id = id.clone();
            tokio::spawn(async move {
                loop {
                    tokio::time::sleep(registry.config.watch_interval()).await;
                    if Instant::now() >= deadline {
                        log::debug!("Log watch for {id} timed out");
                        return;
                    }

                    let fresh: Option<agents::LogFileInfo> =
                        agents::list_recent(kind, &log_dir)
                            .into_iter()
                            .filter(|file| {
                                !existing.contains(&file.path) && file.modified >= started_at
                            })
                            .min_by_key(|file| file.modified);
                    let Some(found) = fresh else {
                        continue;
                    };

                    let mut sessions = registry.sessions.write().await;
                    if let Some(session) = sessions.get_mut(&id)
                        && session.agent == Some(kind)
                        && session.agent_epoch == epoch
                    {
                        log::info!("Session {id}: new conversation log {}", found.id);
                        session.log_id = Some(found.id);
                    }
                    return;
                }
            })
        };

        let mut handles = self.handles.write().await;
        if let Some(entry) = handles.get_mut(&id) {
            if let Some(previous) = entry.watch.replace(task) {
                previous.abort();
            }
        } else {
            // Session closed between detection and here.
            task.abort();
        }
    }

    pub async fn resize(&self, id: &str, cols: u16, rows: u16) -> Result<(), CockpitError> {
        let handles = self.handles.read().await;
        if let Some(entry) = handles.get(id)
            && let Err(err) = entry.pty.resize(cols, rows)
        {
            // A dead PTY refuses resizes; the session is on its way out.
            log::debug!("Resize of {id} failed: {err}");
        }
        Ok(())
    }

    pub async fn get_title(&self, id: &str) -> TitleInfo {
        let (label, detail, enrich) = {
            let sessions = self.sessions.read().await;
            let Some(session) = sessions.get(id) else {
                return TitleInfo {
                    label: String::new(),
                    detail: "Terminal".to_string(),
                };
            };

            let dir_name = short_dir(&session.cwd);
            let (label, detail) = if !session.label.is_empty() {
                let detail = if session.latest_input.is_empty() {
                    dir_name.clone()
                } else {
                    session.latest_input.clone()
                };
                (session.label.clone(), detail)
            } else if session.program.is_empty() || agents::is_shell(&session.program) {
                (String::new(), dir_name.clone())
            } else {
                (
                    String::new(),
                    format!("{} — {dir_name}", session.program),
                )
            };

            // A bare directory name is the least informative detail; for
            // agent sessions, try the conversation log instead.
            let enrich = if detail == dir_name {
                session.agent.and_then(|kind| {
                    session
                        .log_id
                        .clone()
                        .or_else(|| session.resume_parent_log_id.clone())
                        .map(|log_id| (kind, session.cwd.clone(), log_id))
                })
            } else {
                None
            };
            (label, detail, enrich)
        };

        let detail = match enrich {
            Some((kind, cwd, log_id)) => agents::last_response_synopsis(
                kind,
                &agents::log_dir_for(kind, &self.agent_home(kind), &cwd),
                &log_id,
                self.config.synopsis_max_chars,
                self.config.synopsis_tail_bytes,
            )
            .unwrap_or(detail),
            None => detail,
        };

        TitleInfo { label, detail }
    }

    /// User rename. Sticky: auto-derived labels never replace it afterwards.
    pub async fn set_label(&self, id: &str, text: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(session) = sessions.get_mut(id) {
            session.label = text.to_string();
            session.label_is_custom = true;
        }
    }

    /// Ordered per-session summaries, most recent user input first.
    pub async fn list_info(&self) -> Vec<SessionInfo> {
        let order = self.order.read().await.clone();
        let sessions = self.sessions.read().await;
        let now = Utc::now();
        let active_window = ChronoDuration::milliseconds(self.config.active_window_ms as i64);

        let mut infos: Vec<SessionInfo> = order
            .iter()
            .filter_map(|id| sessions.get(id))
            .map(|session| {
                let active = session
                    .last_output_at
                    .is_some_and(|at| now - at <= active_window);
                let is_thinking = session
                    .agent
                    .is_some_and(|kind| session.program == kind.command_name())
                    && active;
                let last_output = if is_thinking {
                    activity::current_action(&session.tail)
                } else {
                    activity::last_meaningful_line(&session.tail)
                };
                SessionInfo {
                    id: session.id.clone(),
                    cwd: session.cwd.to_string_lossy().to_string(),
                    program: session.program.clone(),
                    label: session.label.clone(),
                    latest_input: session.latest_input.clone(),
                    log_id: session.log_id.clone(),
                    last_output,
                    active,
                    last_input_at: session.last_input_at.map(|at| at.timestamp_millis()),
                    is_thinking,
                    agent: session.agent,
                }
            })
            .collect();

        infos.sort_by(|a, b| b.last_input_at.cmp(&a.last_input_at));
        infos
    }

    /// Tear down one session. Safe to call twice; the second call finds
    /// nothing and does nothing.
    pub async fn close(&self, id: &str) {
        let Some(session) = self.sessions.write().await.remove(id) else {
            return;
        };

        if let Some(kind) = session.agent
            && let Some(log_id) = self.resolve_resumable_log_id(&session)
        {
            let mut closed = self.closed.write().await;
            closed.insert(
                0,
                ClosedSessionEntry {
                    label: session.label.clone(),
                    cwd: session.cwd.clone(),
                    log_id,
                    agent: kind,
                    closed_at: Utc::now(),
                },
            );
            closed.truncate(self.config.max_closed_entries);
        }

        self.order.write().await.retain(|other| other != id);

        if let Some(handles) = self.handles.write().await.remove(id) {
            handles.abort_all();
            handles.pty.kill();
        }

        log::info!("Closed session {id}");
        self.emitter.emit(CockpitEvent::SessionClosed {
            session_id: id.to_string(),
        });
    }

    /// Replace the display order. Stale ids from a racing close are dropped;
    /// live ids missing from the request keep their old relative order at the
    /// end, so the order stays a permutation of live sessions.
    pub async fn reorder(&self, ids: Vec<String>) {
        let sessions = self.sessions.read().await;
        let mut order = self.order.write().await;
        let mut next: Vec<String> = ids
            .into_iter()
            .filter(|id| sessions.contains_key(id))
            .collect();
        for id in order.iter() {
            if !next.contains(id) {
                next.push(id.clone());
            }
        }
        *order = next;
    }

    pub async fn has_agent_conversation(&self, id: &str) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .is_some_and(|session| self.resolve_resumable_log_id(session).is_some())
    }

    pub async fn closed_history(&self) -> Vec<ClosedSessionEntry> {
        self.closed.read().await.clone()
    }

    /// Remove and return the closed-history entry for a log id; the caller
    /// then creates a fresh session with it as the resume hint.
    pub async fn restore_from_history(&self, log_id: &str) -> Option<ClosedSessionEntry> {
        let mut closed = self.closed.write().await;
        let index = closed.iter().position(|entry| entry.log_id == log_id)?;
        Some(closed.remove(index))
    }

    /// Read the persisted session list and recreate its tabs, then schedule
    /// staggered resume replays. The stagger keeps one tab's new-log watch
    /// from attributing another tab's log file to itself.
    pub async fn load_or_restore(self: &Arc<Self>) -> Result<Option<SavedSession>, CockpitError> {
        // Defensive reset: restoring over live sessions would double-track.
        let live: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        for id in live {
            self.close(&id).await;
        }

        let Some(saved) = self.store.load() else {
            return Ok(None);
        };

        let mut restored: Vec<(String, SavedTab)> = Vec::new();
        for tab in saved.tabs.iter().take(self.config.max_saved_tabs) {
            let hint = tab.agent().map(|agent| ResumeHint {
                agent,
                log_id: tab.claude_session_id.clone(),
            });
            match self.create(Some(tab.cwd.clone()), hint).await {
                Ok(id) => {
                    if !tab.issue.is_empty() {
                        let mut sessions = self.sessions.write().await;
                        if let Some(session) = sessions.get_mut(&id) {
                            session.label = tab.issue.clone();
                        }
                    }
                    restored.push((id, tab.clone()));
                }
                Err(err) => {
                    log::warn!("Restore of tab in {} failed: {err}", tab.cwd.display());
                }
            }
        }

        self.spawn_resume_replays(restored);
        Ok(Some(saved))
    }

    fn spawn_resume_replays(self: &Arc<Self>, restored: Vec<(String, SavedTab)>) {
        for (index, (id, tab)) in restored.into_iter().enumerate() {
            let Some(agent) = tab.agent() else {
                continue;
            };
            let command = match &tab.claude_session_id {
                Some(log_id) => format!("{} --resume {log_id}\r", agent.command_name()),
                None => format!("{}\r", agent.command_name()),
            };
            let delay = self.config.restore_stagger_delay(index);
            let registry = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                if let Err(err) = registry.send_input(&id, command.as_bytes()).await {
                    log::warn!("Resume replay for {id} failed: {err}");
                }
            });
        }
    }

    /// Persist every live session in display order, resolving the safest
    /// resumable log id per tab.
    pub async fn save_all(&self) -> Result<(), CockpitError> {
        let order = self.order.read().await.clone();
        let sessions = self.sessions.read().await;

        let mut tabs = Vec::new();
        for id in &order {
            let Some(session) = sessions.get(id) else {
                continue;
            };
            let log_id = self.resolve_resumable_log_id(session);
            tabs.push(SavedTab {
                issue: session.label.clone(),
                cwd: session.cwd.clone(),
                had_claude: session.agent == Some(AgentKind::Claude),
                had_gemini: session.agent == Some(AgentKind::Gemini),
                claude_session_id: log_id,
            });
            if tabs.len() >= self.config.max_saved_tabs {
                break;
            }
        }

        self.store.save(&SavedSession {
            tabs,
            active_index: 0,
        })
    }

    /// Parent-preferred resolution: a resume parent with real content wins
    /// over the continuation log the resume created, because continuation
    /// logs are frequently not independently resumable.
    fn resolve_resumable_log_id(&self, session: &Session) -> Option<String> {
        let kind = session.agent?;
        let log_dir = agents::log_dir_for(kind, &self.agent_home(kind), &session.cwd);

        if let Some(parent) = &session.resume_parent_log_id
            && agents::has_conversation_content(kind, &log_dir, parent)
        {
            return Some(parent.clone());
        }
        if let Some(log_id) = &session.log_id
            && agents::has_conversation_content(kind, &log_dir, log_id)
        {
            return Some(log_id.clone());
        }
        None
    }
}

enum TaskSentinel {
    Task(String),
    TaskList(Value),
}

/// Pull complete task sentinels out of the tail buffer, removing each
/// consumed marker so it cannot match again on the next chunk. Incomplete
/// markers stay in place; the next chunk may complete them. With `suppress`
/// set, markers are still consumed but nothing is reported.
fn extract_task_sentinels(tail: &mut String, suppress: bool) -> Vec<TaskSentinel> {
    let mut found = Vec::new();

    loop {
        let task_at = tail.find(TASK_MARKER);
        let list_at = tail.find(TASK_LIST_MARKER);

        // Markers are consumed in stream order; ties go to the list marker.
        let (start, is_list) = match (task_at, list_at) {
            (Some(t), Some(l)) if l <= t => (l, true),
            (Some(t), _) => (t, false),
            (None, Some(l)) => (l, true),
            (None, None) => break,
        };

        if is_list {
            let body_start = start + TASK_LIST_MARKER.len();
            match parse_task_list(&tail[body_start..]) {
                TaskListParse::Complete(tasks, consumed) => {
                    tail.replace_range(start..body_start + consumed, "");
                    if !suppress {
                        found.push(TaskSentinel::TaskList(tasks));
                    }
                }
                TaskListParse::Incomplete => break,
                TaskListParse::Malformed => {
                    // Drop just the marker prefix so the scan can move on.
                    tail.replace_range(start..body_start, "");
                }
            }
        } else {
            let body_start = start + TASK_MARKER.len();
            let Some(end) = tail[body_start..].find("]]") else {
                break;
            };
            let title = tail[body_start..body_start + end].trim().to_string();
            tail.replace_range(start..body_start + end + 2, "");
            if !suppress && !title.is_empty() {
                found.push(TaskSentinel::Task(title));
            }
        }
    }

    found
}

enum TaskListParse {
    /// Parsed JSON plus the number of bytes consumed after the marker prefix.
    Complete(Value, usize),
    Incomplete,
    Malformed,
}

fn parse_task_list(body: &str) -> TaskListParse {
    let mut stream = serde_json::Deserializer::from_str(body).into_iter::<Value>();
    match stream.next() {
        Some(Ok(value)) => {
            let after_json = stream.byte_offset();
            let rest = &body[after_json..];
            let trailing_ws = rest.len() - rest.trim_start().len();
            let rest = rest.trim_start();
            if rest.starts_with("]]") {
                TaskListParse::Complete(value, after_json + trailing_ws + 2)
            } else if rest.is_empty() {
                // The closing "]]" has not arrived yet.
                TaskListParse::Incomplete
            } else {
                TaskListParse::Malformed
            }
        }
        Some(Err(err)) if err.is_eof() => TaskListParse::Incomplete,
        Some(Err(_)) => TaskListParse::Malformed,
        None => TaskListParse::Incomplete,
    }
}

/// Decode a raw PTY chunk as UTF-8. A multibyte character split across two
/// reads leaves its prefix in `pending` until the next chunk completes it;
/// bytes that can never form a valid sequence decode as replacement
/// characters. The carry is at most three bytes.
fn decode_output(pending: &mut Vec<u8>, data: &[u8]) -> String {
    let mut bytes = std::mem::take(pending);
    bytes.extend_from_slice(data);

    let mut text = String::new();
    let mut offset = 0;
    while offset < bytes.len() {
        match std::str::from_utf8(&bytes[offset..]) {
            Ok(valid) => {
                text.push_str(valid);
                offset = bytes.len();
            }
            Err(err) => {
                let valid_end = offset + err.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&bytes[offset..valid_end]));
                match err.error_len() {
                    Some(invalid) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        offset = valid_end + invalid;
                    }
                    None => {
                        pending.extend_from_slice(&bytes[valid_end..]);
                        return text;
                    }
                }
            }
        }
    }
    text
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let head: String = text.chars().take(max_chars).collect();
        format!("{head}…")
    } else {
        text.to_string()
    }
}

fn trim_to_last_chars(text: &mut String, max_chars: usize) {
    let excess = text.chars().count().saturating_sub(max_chars);
    if excess > 0 {
        let cut = text
            .char_indices()
            .nth(excess)
            .map(|(index, _)| index)
            .unwrap_or(0);
        text.drain(..cut);
    }
}
