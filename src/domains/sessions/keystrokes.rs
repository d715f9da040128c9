//! Replays the terminal's line-editing model over raw input bytes so that a
//! committed "command" can be reconstructed from individual keystroke events
//! or pasted chunks alike.

/// Feed one input chunk into the accumulator, returning the lines committed
/// by carriage returns inside it (trimmed, empty commits dropped).
pub fn feed(buffer: &mut String, data: &str) -> Vec<String> {
    // Escape-prefixed chunks are arrow keys, function keys, bracketed-paste
    // markers and the like; none of them contribute printable text.
    if data.starts_with('\x1b') {
        return Vec::new();
    }

    let mut committed = Vec::new();
    for ch in data.chars() {
        match ch {
            '\r' | '\n' => {
                let line = std::mem::take(buffer);
                let line = line.trim();
                if !line.is_empty() {
                    committed.push(line.to_string());
                }
            }
            '\u{7f}' | '\u{8}' => {
                buffer.pop();
            }
            // Ctrl+C / Ctrl+D abandon the current line.
            '\u{3}' | '\u{4}' => {
                buffer.clear();
            }
            ch if ch >= ' ' => buffer.push(ch),
            _ => {}
        }
    }
    committed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(chunks: &[&str]) -> (String, Vec<String>) {
        let mut buffer = String::new();
        let mut committed = Vec::new();
        for chunk in chunks {
            committed.extend(feed(&mut buffer, chunk));
        }
        (buffer, committed)
    }

    #[test]
    fn keystrokes_accumulate_and_commit_on_enter() {
        let (buffer, committed) = feed_all(&["h", "i", "\r"]);
        assert_eq!(committed, vec!["hi"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn paste_commits_identically_to_keystrokes() {
        let (_, keyed) = feed_all(&["l", "s", " ", "-", "l", "\r"]);
        let (_, pasted) = feed_all(&["ls -l\r"]);
        assert_eq!(keyed, pasted);
    }

    #[test]
    fn backspace_removes_last_char() {
        let (_, committed) = feed_all(&["a", "b", "\u{7f}", "c", "\r"]);
        assert_eq!(committed, vec!["ac"]);
    }

    #[test]
    fn interrupt_clears_the_line() {
        let (_, committed) = feed_all(&["garbage", "\u{3}", "real\r"]);
        assert_eq!(committed, vec!["real"]);
    }

    #[test]
    fn escape_prefixed_chunks_are_ignored() {
        let (buffer, committed) = feed_all(&["a", "\x1b[A", "b", "\r"]);
        assert_eq!(committed, vec!["ab"]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn empty_commits_are_dropped() {
        let (_, committed) = feed_all(&["\r", "   \r"]);
        assert!(committed.is_empty());
    }

    #[test]
    fn multi_line_paste_commits_each_line() {
        let (buffer, committed) = feed_all(&["one\rtwo\rthree"]);
        assert_eq!(committed, vec!["one", "two"]);
        assert_eq!(buffer, "three");
    }
}
