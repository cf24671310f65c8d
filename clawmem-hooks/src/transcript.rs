//! Transcript parsing (§6 "Transcript format") for the session-end feedback
//! loop: line-delimited JSON, one `{role, content}` (or `{message:{role,
//! content}}`) object per line, content either a string or a list of
//! `{type:"text", text}` blocks.

use std::path::Path;

use clawmem_core::constants::TRANSCRIPT_MAX_BYTES;
use clawmem_core::{Error, Result};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TranscriptLine {
    #[serde(flatten)]
    direct: Option<RoleContent>,
    message: Option<RoleContent>,
}

#[derive(Debug, Deserialize)]
struct RoleContent {
    role: Option<String>,
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Content {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: Option<String>,
    text: Option<String>,
}

/// Read `path`, validate it against §6's constraints, and concatenate every
/// assistant-role message's text into one string for mention-matching.
///
/// # Errors
/// Returns [`Error::InvalidPath`] if `path` is not an absolute `.jsonl` path,
/// [`Error::InputTooLong`] if the file exceeds [`TRANSCRIPT_MAX_BYTES`], and
/// [`Error::Internal`] on I/O failure.
pub fn assistant_text_from_transcript(path: &str) -> Result<String> {
    let p = Path::new(path);
    if !p.is_absolute() || p.extension().and_then(|e| e.to_str()) != Some("jsonl") {
        return Err(Error::InvalidPath(path.to_string()));
    }

    let metadata = std::fs::metadata(p).map_err(|e| Error::Internal(e.into()))?;
    if metadata.len() > TRANSCRIPT_MAX_BYTES {
        return Err(Error::InputTooLong { actual: metadata.len() as usize, limit: TRANSCRIPT_MAX_BYTES as usize });
    }

    let raw = std::fs::read_to_string(p).map_err(|e| Error::Internal(e.into()))?;
    Ok(extract_assistant_text(&raw))
}

fn extract_assistant_text(raw: &str) -> String {
    let mut out = String::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let Ok(parsed) = serde_json::from_str::<TranscriptLine>(trimmed) else { continue };
        let Some(entry) = parsed.message.or(parsed.direct) else { continue };
        if entry.role.as_deref() != Some("assistant") {
            continue;
        }
        if let Some(content) = entry.content {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&flatten_content(&content));
        }
    }
    out
}

fn flatten_content(content: &Content) -> String {
    match content {
        Content::Text(text) => text.clone(),
        Content::Blocks(blocks) => blocks
            .iter()
            .filter(|b| b.kind.as_deref().unwrap_or("text") == "text")
            .filter_map(|b| b.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_jsonl(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".jsonl").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn extracts_string_content_from_assistant_lines() {
        let raw = r#"{"role":"user","content":"hi"}
{"role":"assistant","content":"decision-sqlite.md has the answer"}"#;
        assert_eq!(extract_assistant_text(raw), "decision-sqlite.md has the answer");
    }

    #[test]
    fn extracts_text_blocks_and_skips_non_text_blocks() {
        let raw = r#"{"message":{"role":"assistant","content":[{"type":"text","text":"see "},{"type":"tool_use","text":"ignored"},{"type":"text","text":"decision-sqlite.md"}]}}"#;
        assert_eq!(extract_assistant_text(raw), "see \ndecision-sqlite.md");
    }

    #[test]
    fn rejects_relative_path() {
        let err = assistant_text_from_transcript("relative/transcript.jsonl").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn rejects_non_jsonl_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let err = assistant_text_from_transcript(file.path().to_str().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn reads_a_real_absolute_jsonl_file() {
        let file = write_jsonl(r#"{"role":"assistant","content":"hello from disk"}"#);
        let text = assistant_text_from_transcript(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "hello from disk");
    }
}
