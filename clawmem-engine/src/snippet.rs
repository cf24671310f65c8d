//! Best-matching snippet extraction (§4.9's boundary contract).
//!
//! The window is reported with a unified-diff-style header so a client can
//! render it alongside a real diff hunk without special-casing retrieval
//! output.

const CONTEXT_LINES: usize = 2;

/// Find the line within `body` with the most query-term hits, then grow a
/// window of up to `max_chars` around it, capped to whole lines and prefixed
/// with a `@@ -start,count @@ (N before, M after)` header.
///
/// `chunk_pos` narrows the search to the neighborhood of a known fragment
/// offset (character position) instead of scanning the whole body — used
/// when the caller already knows which fragment matched.
#[must_use]
pub fn extract_snippet(body: &str, query: &str, max_chars: usize, chunk_pos: Option<usize>) -> String {
    let lines: Vec<&str> = body.lines().collect();
    if lines.is_empty() {
        return "@@ -1,0 @@ (0 before, 0 after)\n".to_string();
    }

    let terms = query_terms(query);
    let best_line = best_matching_line(&lines, &terms, chunk_pos, body);

    let (start, end) = expand_window(&lines, best_line, max_chars);
    let before = best_line - start;
    let after = end - best_line - 1;
    let count = end - start;

    let mut out = format!("@@ -{},{count} @@ ({before} before, {after} after)\n", start + 1);
    for line in &lines[start..end] {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_ascii_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Line index with the highest term-hit count, biased toward the line
/// nearest `chunk_pos` (converted to a line number) on ties.
fn best_matching_line(lines: &[&str], terms: &[String], chunk_pos: Option<usize>, body: &str) -> usize {
    let hint_line = chunk_pos.map(|pos| char_pos_to_line(body, pos));

    if terms.is_empty() {
        return hint_line.unwrap_or(0).min(lines.len() - 1);
    }

    let mut best_idx = 0;
    let mut best_score = -1i64;
    for (idx, line) in lines.iter().enumerate() {
        let lower = line.to_ascii_lowercase();
        let score = terms.iter().filter(|t| lower.contains(t.as_str())).count() as i64;
        let tie_break = hint_line.map(|h| -(idx as i64 - h as i64).abs()).unwrap_or(0);
        let combined = score * 1000 + tie_break;
        if combined > best_score {
            best_score = combined;
            best_idx = idx;
        }
    }
    best_idx
}

fn char_pos_to_line(body: &str, pos: usize) -> usize {
    body.char_indices()
        .take_while(|(idx, _)| *idx < pos)
        .filter(|(_, c)| *c == '\n')
        .count()
}

/// Grow a window of `[CONTEXT_LINES]` around `center`, then keep expanding
/// symmetrically while the total stays within `max_chars`.
fn expand_window(lines: &[&str], center: usize, max_chars: usize) -> (usize, usize) {
    let mut start = center.saturating_sub(CONTEXT_LINES);
    let mut end = (center + CONTEXT_LINES + 1).min(lines.len());

    loop {
        let total: usize = lines[start..end].iter().map(|l| l.len() + 1).sum();
        if total >= max_chars {
            break;
        }
        let mut grew = false;
        if start > 0 {
            start -= 1;
            grew = true;
        }
        if end < lines.len() {
            end += 1;
            grew = true;
        }
        if !grew {
            break;
        }
    }
    (start, end)
}
