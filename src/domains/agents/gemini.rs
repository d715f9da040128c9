//! Gemini CLI conversation logs: single JSON documents under
//! `<home>/tmp/<sha256(cwd)>/chats/`. Each document carries a `sessionId`
//! and a `messages` array of `{type, content}` turns.

use super::{LogFileInfo, collapse_whitespace};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub fn project_hash(cwd: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(cwd.to_string_lossy().as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn chats_dir(gemini_home: &Path, cwd: &Path) -> PathBuf {
    gemini_home.join("tmp").join(project_hash(cwd)).join("chats")
}

pub fn list_logs(log_dir: &Path) -> Vec<LogFileInfo> {
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return Vec::new();
    };
    entries
        .flatten()
        .filter_map(|entry| {
            let path = entry.path();
            if path.extension().map(|ext| ext == "json") != Some(true) {
                return None;
            }
            let modified = entry
                .metadata()
                .and_then(|meta| meta.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            // Prefer the embedded sessionId; fall back to the file stem so a
            // partially written file still gets a stable identifier.
            let id = read_document(&path)
                .and_then(|doc| {
                    doc.get("sessionId")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .or_else(|| path.file_stem().map(|s| s.to_string_lossy().to_string()))?;
            Some(LogFileInfo { id, path, modified })
        })
        .collect()
}

fn read_document(path: &Path) -> Option<Value> {
    let raw = std::fs::read_to_string(path).ok()?;
    serde_json::from_str(&raw).ok()
}

fn find_document(log_dir: &Path, log_id: &str) -> Option<Value> {
    // Session ids usually match the file name, so try that first.
    for candidate in [
        log_dir.join(format!("{log_id}.json")),
        log_dir.join(log_id),
    ] {
        if let Some(doc) = read_document(&candidate) {
            return Some(doc);
        }
    }
    let Ok(entries) = std::fs::read_dir(log_dir) else {
        return None;
    };
    entries.flatten().find_map(|entry| {
        let doc = read_document(&entry.path())?;
        if doc.get("sessionId").and_then(Value::as_str) == Some(log_id) {
            Some(doc)
        } else {
            None
        }
    })
}

fn is_conversational(turn_type: Option<&str>) -> bool {
    matches!(turn_type, Some("user") | Some("gemini") | Some("model"))
}

pub fn has_conversation_content(log_dir: &Path, log_id: &str) -> bool {
    let Some(doc) = find_document(log_dir, log_id) else {
        return false;
    };
    doc.get("messages")
        .and_then(Value::as_array)
        .is_some_and(|messages| {
            messages.iter().any(|message| {
                is_conversational(message.get("type").and_then(Value::as_str))
                    && message
                        .get("content")
                        .and_then(Value::as_str)
                        .is_some_and(|content| !content.trim().is_empty())
            })
        })
}

/// Last model turn with non-empty text. Gemini logs are bounded in size, so
/// the whole document is parsed.
pub fn last_response_synopsis(log_dir: &Path, log_id: &str, max_chars: usize) -> Option<String> {
    let doc = find_document(log_dir, log_id)?;
    let messages = doc.get("messages")?.as_array()?;
    messages.iter().rev().find_map(|message| {
        let turn_type = message.get("type").and_then(Value::as_str);
        if !matches!(turn_type, Some("gemini") | Some("model")) {
            return None;
        }
        let content = message.get("content").and_then(Value::as_str)?;
        if content.trim().is_empty() {
            return None;
        }
        Some(collapse_whitespace(content, max_chars))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_chat(dir: &Path, name: &str, json: &str) {
        std::fs::write(dir.join(name), json).expect("write");
    }

    #[test]
    fn project_hash_is_stable_hex() {
        let hash = project_hash(Path::new("/Users/dev/proj"));
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, project_hash(Path::new("/Users/dev/proj")));
        assert_ne!(hash, project_hash(Path::new("/Users/dev/other")));
    }

    #[test]
    fn list_prefers_embedded_session_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_chat(
            dir.path(),
            "chat-1.json",
            r#"{"sessionId":"sess-abc","messages":[]}"#,
        );
        write_chat(dir.path(), "chat-2.json", r#"{"messages":[]}"#);

        let mut ids: Vec<String> = list_logs(dir.path()).into_iter().map(|f| f.id).collect();
        ids.sort();
        assert_eq!(ids, vec!["chat-2".to_string(), "sess-abc".to_string()]);
    }

    #[test]
    fn content_check_requires_non_empty_turn() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_chat(
            dir.path(),
            "empty.json",
            r#"{"sessionId":"empty","messages":[{"type":"info","content":"banner"}]}"#,
        );
        write_chat(
            dir.path(),
            "real.json",
            r#"{"sessionId":"real","messages":[{"type":"user","content":"hi"}]}"#,
        );

        assert!(!has_conversation_content(dir.path(), "empty"));
        assert!(has_conversation_content(dir.path(), "real"));
        assert!(!has_conversation_content(dir.path(), "missing"));
    }

    #[test]
    fn finds_document_by_embedded_session_id() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_chat(
            dir.path(),
            "2024-05-01-chat.json",
            r#"{"sessionId":"sess-9","messages":[{"type":"user","content":"hi"}]}"#,
        );
        assert!(has_conversation_content(dir.path(), "sess-9"));
    }

    #[test]
    fn synopsis_takes_last_model_turn() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_chat(
            dir.path(),
            "chat.json",
            r#"{"sessionId":"s","messages":[
                {"type":"user","content":"q1"},
                {"type":"gemini","content":"first"},
                {"type":"user","content":"q2"},
                {"type":"model","content":"  final   reply  "}
            ]}"#,
        );

        let synopsis = last_response_synopsis(dir.path(), "s", 120);
        assert_eq!(synopsis.as_deref(), Some("final reply"));
    }

    #[test]
    fn malformed_document_reads_as_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_chat(dir.path(), "bad.json", "{not json");
        assert!(!has_conversation_content(dir.path(), "bad"));
        assert!(last_response_synopsis(dir.path(), "bad", 120).is_none());
    }
}
