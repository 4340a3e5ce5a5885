//! JSON extraction from model output
//!
//! Models are instructed to answer with a single-line JSON object, but real
//! output arrives wrapped in chatter, fenced code blocks, with raw newlines
//! inside string literals, or cut off mid-object. [`extract_json`] peels all
//! of that back before the normalizers see the value.

use serde_json::Value;

/// Extract a JSON object from raw model output.
///
/// Tried in order, on the whole text and on every fenced code block:
/// 1. direct parse,
/// 2. balanced-brace scan from the first `{` (skips surrounding chatter),
/// 3. raw-newline sanitization inside string literals,
/// 4. truncation repair (append the missing close-quote and braces).
///
/// Returns the parse failure message when nothing yields a JSON object.
pub fn extract_json(raw: &str) -> Result<Value, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("empty model output".to_string());
    }

    let mut candidates: Vec<&str> = vec![trimmed];
    candidates.extend(fenced_blocks(trimmed));

    let mut last_error = String::new();
    for candidate in candidates {
        match try_candidate(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = e,
        }
    }

    Err(last_error)
}

fn try_candidate(text: &str) -> Result<Value, String> {
    if let Ok(value) = serde_json::from_str::<Value>(text)
        && value.is_object()
    {
        return Ok(value);
    }

    let Some(start) = text.find('{') else {
        return Err("no JSON object found in model output".to_string());
    };

    match scan_balanced(&text[start..]) {
        Scan::Complete(len) => {
            let slice = &text[start..start + len];
            let sanitized = sanitize_string_newlines(slice);
            serde_json::from_str::<Value>(&sanitized).map_err(|e| e.to_string())
        }
        Scan::Truncated { open_braces, in_string } => {
            let mut repaired = sanitize_string_newlines(text[start..].trim_end());
            if in_string {
                repaired.push('"');
            }
            for _ in 0..open_braces {
                repaired.push('}');
            }
            serde_json::from_str::<Value>(&repaired).map_err(|e| e.to_string())
        }
    }
}

/// Contents of every triple-backtick fence, language tag stripped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after_open = &rest[open + 3..];
        let Some(close) = after_open.find("```") else { break };
        let body = &after_open[..close];
        // Drop a leading language tag line such as "json"
        let body = match body.find('\n') {
            Some(nl) if !body[..nl].trim().contains('{') => &body[nl + 1..],
            _ => body,
        };
        blocks.push(body.trim());
        rest = &after_open[close + 3..];
    }
    blocks
}

enum Scan {
    /// Byte length of the balanced object starting at offset 0
    Complete(usize),
    Truncated { open_braces: u32, in_string: bool },
}

/// Walk a `{`-prefixed slice tracking string and escape state.
fn scan_balanced(text: &str) -> Scan {
    let mut depth: u32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Scan::Complete(i + 1);
                }
            }
            _ => {}
        }
    }

    Scan::Truncated {
        open_braces: depth,
        in_string,
    }
}

/// Replace raw newlines inside string literals with the `\n` escape.
fn sanitize_string_newlines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            out.push(c);
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => {
                out.push(c);
                escaped = true;
            }
            '"' => {
                in_string = !in_string;
                out.push(c);
            }
            '\n' if in_string => out.push_str("\\n"),
            '\r' if in_string => {}
            _ => out.push(c),
        }
    }
    out
}
