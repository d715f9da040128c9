//! Claude Code conversation logs: one JSONL file per session under
//! `<home>/projects/<encoded cwd>/`, where the encoding replaces every `/`
//! in the absolute path with `-`. The file stem is the session id.

use super::{LogFileInfo, collapse_whitespace};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn encode_project_dir(cwd: &Path) -> String {
    cwd.to_string_lossy().replace('/', "-")
}

pub fn project_log_dir(claude_home: &Path, cwd: &Path) -> PathBuf {
    claude_home.join("projects").join(encode_project_dir(cwd))
}

pub fn list_logs(log_dir: &Path) -> Vec<LogFileInfo> {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().map(|ext| ext == "jsonl") != Some(true) {
                return None;
            }
            let id = path.file_stem()?.to_string_lossy().to_string();
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            Some(LogFileInfo { id, path, modified })
        })
        .collect()
}

fn log_path(log_dir: &Path, log_id: &str) -> PathBuf {
    log_dir.join(format!("{log_id}.jsonl"))
}

/// True when the log holds at least one user or assistant turn. Bookkeeping
/// entries (summaries, file-history snapshots) do not count.
pub fn has_conversation_content(log_dir: &Path, log_id: &str) -> bool {
    let Ok(file) = File::open(log_path(log_dir, log_id)) else {
        return false;
    };
    let reader = BufReader::new(file);
    for line in reader.lines() {
        let Ok(line) = line else {
            return false;
        };
        if line.trim().is_empty() {
            continue;
        }
        let Ok(entry) = serde_json::from_str::<Value>(&line) else {
            continue;
        };
        if matches!(
            entry.get("type").and_then(Value::as_str),
            Some("user") | Some("assistant")
        ) {
            return true;
        }
    }
    false
}

/// Pull the last assistant text out of the log's trailing bytes. The file
/// grows without bound, so only `tail_bytes` from the end are read; the first
/// line of that window is usually truncated and skipped by the JSON parse.
pub fn last_response_synopsis(
    log_dir: &Path,
    log_id: &str,
    max_chars: usize,
    tail_bytes: u64,
) -> Option<String> {
    let mut file = File::open(log_path(log_dir, log_id)).ok()?;
    let len = file.metadata().ok()?.len();
    let start = len.saturating_sub(tail_bytes);
    file.seek(SeekFrom::Start(start)).ok()?;

    let mut window = String::new();
    file.read_to_string(&mut window).ok()?;

    for line in window.lines().rev() {
        let Ok(entry) = serde_json::from_str::<Value>(line) else {
            continue;
        };
        if entry.get("type").and_then(Value::as_str) != Some("assistant") {
            continue;
        }
        if let Some(text) = assistant_text(&entry)
            && !text.trim().is_empty()
        {
            return Some(collapse_whitespace(&text, max_chars));
        }
    }
    None
}

fn assistant_text(entry: &Value) -> Option<String> {
    let content = entry.get("message")?.get("content")?;
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => blocks.iter().find_map(|block| {
            if block.get("type").and_then(Value::as_str) == Some("text") {
                block
                    .get("text")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            } else {
                None
            }
        }),
        _ => None,
    }
}
