//! XML-like injection-block wrapping (§6 "Injection block") so the host can
//! recognize and strip additional context the hooks inject.

/// Wrap `body` in `<tag>...</tag>`, trimming surrounding whitespace.
#[must_use]
pub fn wrap(tag: &str, body: &str) -> String {
    format!("<{tag}>\n{}\n</{tag}>", body.trim())
}

/// `<vault-context>`: retrieval results injected ahead of a user prompt.
#[must_use]
pub fn vault_context(body: &str) -> String {
    wrap("vault-context", body)
}

/// `<vault-session>`: session-start handoff/recent-activity summary.
#[must_use]
pub fn vault_session(body: &str) -> String {
    wrap("vault-session", body)
}

/// `<vault-handoff>`: the prior session's handoff note, verbatim.
#[must_use]
pub fn vault_handoff(body: &str) -> String {
    wrap("vault-handoff", body)
}

/// `<vault-staleness>`: a warning about documents overdue for `review_by`.
#[must_use]
pub fn vault_staleness(body: &str) -> String {
    wrap("vault-staleness", body)
}

/// `<vault-decisions>`: recent `Decision`-typed documents.
#[must_use]
pub fn vault_decisions(body: &str) -> String {
    wrap("vault-decisions", body)
}

/// Join non-empty blocks with a blank line, or `None` if every block was
/// empty — callers use this to decide whether there's anything to inject.
#[must_use]
pub fn join_blocks(blocks: &[String]) -> Option<String> {
    let joined: Vec<&str> = blocks.iter().map(String::as_str).filter(|b| !b.is_empty()).collect();
    if joined.is_empty() {
        None
    } else {
        Some(joined.join("\n\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_and_trims() {
        assert_eq!(wrap("vault-context", "  hi  "), "<vault-context>\nhi\n</vault-context>");
    }

    #[test]
    fn join_blocks_drops_empties() {
        let joined = join_blocks(&["".to_string(), vault_context("hi").to_string()]).unwrap();
        assert!(joined.contains("<vault-context>"));
    }

    #[test]
    fn join_blocks_is_none_when_all_empty() {
        assert!(join_blocks(&["".to_string(), "".to_string()]).is_none());
    }
}
