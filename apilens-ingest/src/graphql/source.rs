//! Source helpers: comment/string masking and description lookback.

/// Replace comments and string literals with spaces.
///
/// Newlines are kept and every other masked byte becomes one space, so byte
/// offsets into the masked text are valid offsets into the original.
pub(crate) fn mask(sdl: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Code,
        Comment,
        String,
        BlockString,
    }

    let bytes = sdl.as_bytes();
    let mut out = bytes.to_vec();
    let mut state = State::Code;
    let mut i = 0;

    let blank = |out: &mut Vec<u8>, from: usize, to: usize| {
        for b in &mut out[from..to] {
            if *b != b'\n' {
                *b = b' ';
            }
        }
    };

    while i < bytes.len() {
        let rest = &bytes[i..];
        match state {
            State::Code => {
                if rest.starts_with(b"\"\"\"") {
                    blank(&mut out, i, i + 3);
                    state = State::BlockString;
                    i += 3;
                    continue;
                }
                match bytes[i] {
                    b'"' => state = State::String,
                    b'#' => state = State::Comment,
                    _ => {
                        i += 1;
                        continue;
                    }
                }
                blank(&mut out, i, i + 1);
                i += 1;
            }
            State::Comment => {
                if bytes[i] == b'\n' {
                    state = State::Code;
                } else {
                    blank(&mut out, i, i + 1);
                }
                i += 1;
            }
            State::String => match bytes[i] {
                b'\\' => {
                    let end = if bytes.get(i + 1).is_some_and(u8::is_ascii) {
                        i + 2
                    } else {
                        i + 1
                    };
                    blank(&mut out, i, end);
                    i = end;
                }
                b'"' => {
                    blank(&mut out, i, i + 1);
                    state = State::Code;
                    i += 1;
                }
                b'\n' => {
                    state = State::Code;
                    i += 1;
                }
                _ => {
                    blank(&mut out, i, i + 1);
                    i += 1;
                }
            },
            State::BlockString => {
                if rest.starts_with(b"\\\"\"\"") {
                    blank(&mut out, i, i + 4);
                    i += 4;
                } else if rest.starts_with(b"\"\"\"") {
                    blank(&mut out, i, i + 3);
                    state = State::Code;
                    i += 3;
                } else {
                    blank(&mut out, i, i + 1);
                    i += 1;
                }
            }
        }
    }

    // Only whole UTF-8 sequences are blanked, so the buffer stays valid.
    String::from_utf8_lossy(&out).into_owned()
}

/// The description string directly preceding byte offset `pos`, if it starts
/// within `max_lines` lines.
pub(crate) fn description_before(sdl: &str, pos: usize, max_lines: usize) -> Option<String> {
    let before = sdl.get(..pos)?.trim_end();

    if let Some(inner) = before.strip_suffix("\"\"\"") {
        let open = inner.rfind("\"\"\"")?;
        let block = &inner[open + 3..];
        if block.matches('\n').count() > max_lines {
            return None;
        }
        return normalize_block(block);
    }

    let inner = before.strip_suffix('"')?;
    let line_start = inner.rfind('\n').map_or(0, |n| n + 1);
    let open = inner[line_start..].rfind('"')? + line_start;
    let lead = inner[line_start..open].trim();
    if !(lead.is_empty() || lead.ends_with(['{', '(', ','])) {
        return None;
    }
    let text = inner[open + 1..].replace("\\\"", "\"");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// Trim each line of a block string and drop leading/trailing blank lines.
fn normalize_block(block: &str) -> Option<String> {
    let lines: Vec<&str> = block.lines().map(str::trim).collect();
    let text = lines.join("\n");
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_preserves_offsets() {
        let sdl = "# type Fake { x: Int }\n\"\"\"type Ghost {}\"\"\"\ntype Real { s: String }";
        let masked = mask(sdl);

        assert_eq!(masked.len(), sdl.len());
        assert!(!masked.contains("Fake"));
        assert!(!masked.contains("Ghost"));
        assert_eq!(masked.find("type Real"), sdl.find("type Real"));
    }

    #[test]
    fn test_mask_handles_escapes_and_multibyte() {
        let sdl = "\"say \\\"hé\\\"\" type A";
        let masked = mask(sdl);
        assert_eq!(masked.len(), sdl.len());
        assert!(masked.trim_start().starts_with("type A"));
    }

    #[test]
    fn test_block_description() {
        let sdl = "\"\"\"\n  A registered user.\n  Second line.\n\"\"\"\ntype User { id: ID }";
        let pos = sdl.find("type").unwrap();
        assert_eq!(
            description_before(sdl, pos, 20).as_deref(),
            Some("A registered user.\nSecond line.")
        );
    }

    #[test]
    fn test_inline_description() {
        let sdl = "type User {\n  \"The id\"\n  id: ID\n}";
        let pos = sdl.find("id:").unwrap();
        assert_eq!(description_before(sdl, pos, 20).as_deref(), Some("The id"));
    }

    #[test]
    fn test_lookback_limit() {
        let body = "line\n".repeat(30);
        let sdl = format!("\"\"\"\n{body}\"\"\"\ntype T {{ a: Int }}");
        let pos = sdl.find("type").unwrap();
        assert_eq!(description_before(&sdl, pos, 20), None);
        assert!(description_before(&sdl, pos, 40).is_some());
    }

    #[test]
    fn test_default_value_is_not_a_description() {
        let sdl = "input F {\n  a: String = \"x\"\n  b: Int\n}";
        let pos = sdl.find("b:").unwrap();
        assert_eq!(description_before(sdl, pos, 20), None);
    }

    #[test]
    fn test_no_description() {
        let sdl = "type A { a: Int }\ntype B { b: Int }";
        let pos = sdl.find("type B").unwrap();
        assert_eq!(description_before(sdl, pos, 20), None);
    }
}
