/// Strip terminal escape sequences from raw PTY output so the text heuristics
/// see plain characters. Unlike a real terminal we never answer queries here;
/// everything escape-shaped is simply removed.
pub fn strip_control_sequences(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut kept = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != 0x1b {
            // Carriage returns confuse line splitting (progress redraws).
            if bytes[i] != b'\r' {
                kept.push(bytes[i]);
            }
            i += 1;
            continue;
        }

        if i + 1 >= bytes.len() {
            // Unterminated escape at the end of the chunk.
            break;
        }

        match bytes[i + 1] {
            b'[' => {
                let mut cursor = i + 2;
                while cursor < bytes.len() {
                    let byte = bytes[cursor];
                    // Parameter bytes 0x30-0x3F, intermediate bytes 0x20-0x2F.
                    if (0x20..=0x3F).contains(&byte) {
                        cursor += 1;
                        continue;
                    }
                    break;
                }
                if cursor >= bytes.len() {
                    break;
                }
                // cursor sits on the terminator byte.
                i = cursor + 1;
            }
            b']' => {
                // OSC runs to BEL or ST.
                let mut cursor = i + 2;
                let mut end = None;
                while cursor < bytes.len() {
                    if bytes[cursor] == 0x07 {
                        end = Some(cursor + 1);
                        break;
                    }
                    if bytes[cursor] == 0x1b
                        && cursor + 1 < bytes.len()
                        && bytes[cursor + 1] == b'\\'
                    {
                        end = Some(cursor + 2);
                        break;
                    }
                    cursor += 1;
                }
                match end {
                    Some(next) => i = next,
                    None => break,
                }
            }
            b'P' => {
                // DCS runs to ST.
                let mut cursor = i + 2;
                let mut end = None;
                while cursor < bytes.len() {
                    if bytes[cursor] == 0x1b
                        && cursor + 1 < bytes.len()
                        && bytes[cursor + 1] == b'\\'
                    {
                        end = Some(cursor + 2);
                        break;
                    }
                    cursor += 1;
                }
                match end {
                    Some(next) => i = next,
                    None => break,
                }
            }
            _ => {
                // Two-byte forms (ESC 7, ESC =) and charset designations
                // carrying intermediate bytes (ESC ( B).
                let mut cursor = i + 1;
                while cursor < bytes.len() && (0x20..=0x2F).contains(&bytes[cursor]) {
                    cursor += 1;
                }
                if cursor >= bytes.len() {
                    break;
                }
                i = cursor + 1;
            }
        }
    }

    String::from_utf8_lossy(&kept).into_owned()
}
