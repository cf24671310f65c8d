//! Tolerant JSON-repair parser (§4.4 A-MEM construct-note: "strip markdown
//! fences, locate the first `{`/`[`, and if parsing fails attempt repairs").
//!
//! Kept as a pure function with no I/O so it can be fuzzed in isolation
//! (§9 open design note).

use serde_json::Value;

/// Best-effort parse of an LLM completion as JSON. Returns `None` rather
/// than erroring — callers treat a failed repair as an empty note, never a
/// fatal error (§4.4: "on failure the note is empty but persisted").
#[must_use]
pub fn repair_json(raw: &str) -> Option<Value> {
    let stripped = strip_code_fence(raw);
    let sliced = slice_to_outermost_structure(stripped)?;

    if let Ok(v) = serde_json::from_str(sliced) {
        return Some(v);
    }

    let no_trailing_commas = strip_trailing_commas(sliced);
    if let Ok(v) = serde_json::from_str(&no_trailing_commas) {
        return Some(v);
    }

    let closed = close_truncated(&no_trailing_commas);
    serde_json::from_str(&closed).ok()
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(after_open) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let after_open = after_open
        .strip_prefix("json")
        .or_else(|| after_open.strip_prefix("JSON"))
        .unwrap_or(after_open);
    let after_open = after_open.trim_start_matches(['\n', '\r']);
    after_open.rsplit_once("```").map_or(after_open, |(body, _)| body)
}

fn slice_to_outermost_structure(s: &str) -> Option<&str> {
    let start = s.find(['{', '['])?;
    let opener = s.as_bytes()[start];
    let closer = if opener == b'{' { b'}' } else { b']' };
    let end = s.as_bytes()[start..]
        .iter()
        .rposition(|&b| b == closer)
        .map_or(s.len(), |pos| start + pos + 1);
    Some(&s[start..end])
}

/// Remove a trailing comma immediately before a closing `}`/`]`, which
/// local models emit often enough to need handling explicitly.
fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let chars: Vec<char> = s.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c == ',' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            if j < chars.len() && (chars[j] == '}' || chars[j] == ']') {
                i += 1;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

/// Append closing brackets for any still-open `{`/`[` structures, ignoring
/// bracket characters inside string literals.
fn close_truncated(s: &str) -> String {
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in s.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }
    let mut out = s.to_string();
    while let Some(closer) = stack.pop() {
        out.push(closer);
    }
    out
}
