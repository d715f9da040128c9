use serde::Serialize;

/// Events emitted by the session registry towards its consumer (the UI shell
/// or any other embedder). Raw terminal output is tagged by session id; task
/// events are extracted from sentinel markers in agent output.
#[derive(Debug, Clone, Serialize)]
#[serde(
    tag = "type",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum CockpitEvent {
    TerminalOutput {
        session_id: String,
        data: String,
    },
    TaskDetected {
        title: String,
    },
    TaskListReplaced {
        tasks: serde_json::Value,
    },
    SessionClosed {
        session_id: String,
    },
}

impl CockpitEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CockpitEvent::TerminalOutput { .. } => "cockpit:terminal-output",
            CockpitEvent::TaskDetected { .. } => "cockpit:task-detected",
            CockpitEvent::TaskListReplaced { .. } => "cockpit:task-list-replaced",
            CockpitEvent::SessionClosed { .. } => "cockpit:session-closed",
        }
    }
}

pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: CockpitEvent);
}

/// Emitter for headless use: logs every event instead of delivering it.
pub struct LogEmitter;

impl EventEmitter for LogEmitter {
    fn emit(&self, event: CockpitEvent) {
        log::trace!("event {}: {event:?}", event.name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_are_stable() {
        assert_eq!(
            CockpitEvent::TerminalOutput {
                session_id: "tab-1".to_string(),
                data: String::new(),
            }
            .name(),
            "cockpit:terminal-output"
        );
        assert_eq!(
            CockpitEvent::TaskDetected {
                title: "x".to_string()
            }
            .name(),
            "cockpit:task-detected"
        );
        assert_eq!(
            CockpitEvent::TaskListReplaced {
                tasks: serde_json::json!([])
            }
            .name(),
            "cockpit:task-list-replaced"
        );
        assert_eq!(
            CockpitEvent::SessionClosed {
                session_id: "tab-1".to_string()
            }
            .name(),
            "cockpit:session-closed"
        );
    }

    #[test]
    fn events_serialize_with_camel_case_payloads() {
        let json = serde_json::to_string(&CockpitEvent::TerminalOutput {
            session_id: "tab-3".to_string(),
            data: "hello".to_string(),
        })
        .expect("serialize");
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"data\""));
    }
}
