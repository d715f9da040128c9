//! Pure text heuristics over raw terminal output.
//!
//! Agent CLIs redraw a single status line constantly, so the literal last
//! line is often a spinner frame. These functions strip escape noise, drop
//! known chrome, and classify the most recent informative line.

use crate::domains::terminal::strip_control_sequences;
use once_cell::sync::Lazy;
use regex::Regex;

/// Tool names agent CLIs print when invoking a tool. Matching is exact, plus
/// MCP-namespaced names of the form `mcp__server__tool`.
const TOOL_NAMES: &[&str] = &[
    "Bash",
    "Read",
    "Write",
    "Edit",
    "MultiEdit",
    "Glob",
    "Grep",
    "Task",
    "WebFetch",
    "WebSearch",
    "TodoWrite",
    "NotebookEdit",
];

/// Status vocabulary that means "the agent is busy but not in a named tool".
const THINKING_WORDS: &[&str] = &[
    "thinking",
    "pondering",
    "reasoning",
    "brewing",
    "churning",
    "computing",
    "crafting",
    "deliberating",
    "envisioning",
    "hatching",
    "musing",
    "simmering",
    "synthesizing",
    "vibing",
    "working",
];

static TOOL_CALL: Lazy<Regex> = Lazy::new(|| {
    // Tool name followed by an opening paren or bracket and the argument text.
    Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)[(\[](.*)$").unwrap_or_else(|err| panic!("{err}"))
});

static SERVER_METHOD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z][\w-]*)\[([\w-]+)\]\((.*?)\)?\s*$").unwrap_or_else(|err| panic!("{err}"))
});

static READING_FILES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\breading\s+(\d+)\s+files?\b").unwrap_or_else(|err| panic!("{err}"))
});

static PROMPT_USER_HOST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\S+@\S+\s").unwrap_or_else(|err| panic!("{err}"))
});

const ACTION_ARG_MAX: usize = 40;

fn is_mcp_tool(name: &str) -> bool {
    let mut parts = name.split("__");
    parts.next() == Some("mcp") && parts.next().is_some() && parts.next().is_some()
}

fn is_noise(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }
    // Bare prompt glyphs left behind by redraws.
    if matches!(trimmed, ">" | "$" | "%" | "❯") {
        return true;
    }
    // Keyboard hint chrome ("? for shortcuts", "esc to interrupt").
    if trimmed.contains("? for shortcuts") || trimmed.contains("esc to interrupt") {
        return true;
    }
    if PROMPT_USER_HOST.is_match(trimmed) {
        return true;
    }
    false
}

fn meaningful_lines(raw_tail: &str) -> Vec<String> {
    strip_control_sequences(raw_tail)
        .lines()
        .map(str::trim)
        .filter(|line| !is_noise(line))
        .map(str::to_string)
        .collect()
}

/// Last informative line of a raw output tail, or empty when everything is
/// blank or chrome.
pub fn last_meaningful_line(raw_tail: &str) -> String {
    meaningful_lines(raw_tail).pop().unwrap_or_default()
}

fn truncate_action_arg(args: &str) -> String {
    let cleaned = args
        .trim_end_matches([')', ']'])
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.chars().count() > ACTION_ARG_MAX {
        let head: String = cleaned.chars().take(ACTION_ARG_MAX).collect();
        format!("{head}…")
    } else {
        cleaned
    }
}

fn classify_line(line: &str) -> Option<String> {
    // Priority order is part of the contract: a tool call beats the
    // server/method form, which beats the busy vocabulary, which beats
    // progress lines. Reordering changes what a mixed line reports.
    let stripped = line.trim_start_matches(['⏺', '●', '*', '·', '✻', '✽', '✶', '✳', '✢']).trim();

    if let Some(caps) = TOOL_CALL.captures(stripped) {
        let name = &caps[1];
        if TOOL_NAMES.contains(&name) || is_mcp_tool(name) {
            return Some(format!("{name}: {}", truncate_action_arg(&caps[2])));
        }
    }

    if let Some(caps) = SERVER_METHOD.captures(stripped) {
        return Some(format!(
            "{}[{}]: {}",
            &caps[1],
            &caps[2],
            truncate_action_arg(&caps[3])
        ));
    }

    let lowered = stripped.to_lowercase();
    if THINKING_WORDS
        .iter()
        .any(|word| lowered.starts_with(word) || lowered.contains(&format!(" {word}")))
    {
        return Some("Thinking...".to_string());
    }

    if let Some(caps) = READING_FILES.captures(stripped) {
        return Some(format!("Reading {} files", &caps[1]));
    }

    None
}

/// Classify the most recent informative line of an agent's output tail into a
/// short "what is it doing" string. Falls back to "Thinking..." when nothing
/// matches, since the tail of a busy agent is usually a spinner frame.
pub fn current_action(raw_tail: &str) -> String {
    let lines = meaningful_lines(raw_tail);
    for line in lines.iter().rev() {
        if let Some(action) = classify_line(line) {
            return action;
        }
    }
    "Thinking...".to_string()
}
