//! Fail-soft YAML frontmatter extraction (§4.3 "parse frontmatter
//! (fail-soft)"). A malformed or absent frontmatter block never aborts
//! indexing; the whole file is simply treated as body with no metadata.

use std::collections::BTreeMap;

/// Known metadata fields a frontmatter block may declare, plus an `extra`
/// bag of any other scalar keys (folded into `frontmatter` fragments by the
/// splitter).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter {
    pub title: Option<String>,
    pub domain: Option<String>,
    pub workstream: Option<String>,
    pub tags: Vec<String>,
    pub content_type: Option<String>,
    pub extra: BTreeMap<String, String>,
}

/// Split `raw` into `(frontmatter, body)`. Recognizes a leading `---\n` ...
/// `\n---` block parsed as YAML; anything else (no fence, unterminated
/// fence, or a fence that doesn't parse as a YAML mapping) returns an empty
/// `Frontmatter` and the original text untouched.
#[must_use]
pub fn parse_frontmatter(raw: &str) -> (Frontmatter, String) {
    let Some(after_open) = raw.strip_prefix("---\n").or_else(|| raw.strip_prefix("---\r\n")) else {
        return (Frontmatter::default(), raw.to_string());
    };

    let Some(close_idx) = find_closing_fence(after_open) else {
        return (Frontmatter::default(), raw.to_string());
    };

    let yaml_block = &after_open[..close_idx];
    let body = after_open[close_idx..]
        .splitn(2, '\n')
        .nth(1)
        .unwrap_or_default()
        .to_string();

    let Ok(serde_yaml::Value::Mapping(map)) = serde_yaml::from_str::<serde_yaml::Value>(yaml_block) else {
        return (Frontmatter::default(), raw.to_string());
    };

    let mut fm = Frontmatter::default();
    for (key, value) in map {
        let Some(key) = key.as_str() else { continue };
        match key {
            "title" => fm.title = value.as_str().map(str::to_string),
            "domain" => fm.domain = value.as_str().map(str::to_string),
            "workstream" => fm.workstream = value.as_str().map(str::to_string),
            "content_type" | "type" => fm.content_type = value.as_str().map(str::to_string),
            "tags" => fm.tags = value_to_string_list(&value),
            _ => {
                if let Some(scalar) = scalar_to_string(&value) {
                    fm.extra.insert(key.to_string(), scalar);
                }
            }
        }
    }

    (fm, body)
}

fn find_closing_fence(s: &str) -> Option<usize> {
    let mut offset = 0;
    for line in s.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "---" {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}

fn value_to_string_list(value: &serde_yaml::Value) -> Vec<String> {
    match value {
        serde_yaml::Value::Sequence(items) => items.iter().filter_map(|v| v.as_str().map(str::to_string)).collect(),
        serde_yaml::Value::String(s) => s.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect(),
        _ => Vec::new(),
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract a title from the first `#`/`##` heading, falling back to `None`
/// so the caller can fall further back to the filename (§4.3).
#[must_use]
pub fn first_heading(body: &str) -> Option<String> {
    body.lines()
        .find_map(|line| line.trim_start().strip_prefix('#').map(str::trim).map(|t| t.trim_start_matches('#').trim().to_string()))
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_frontmatter_returns_body_unchanged() {
        let (fm, body) = parse_frontmatter("# Just a title\n\nbody text");
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, "# Just a title\n\nbody text");
    }

    #[test]
    fn parses_known_fields() {
        let raw = "---\ntitle: Hello\ndomain: backend\ntags: [a, b]\n---\nbody here\n";
        let (fm, body) = parse_frontmatter(raw);
        assert_eq!(fm.title.as_deref(), Some("Hello"));
        assert_eq!(fm.domain.as_deref(), Some("backend"));
        assert_eq!(fm.tags, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(body, "body here\n");
    }

    #[test]
    fn unterminated_fence_is_fail_soft() {
        let raw = "---\ntitle: Hello\nno closing fence\n";
        let (fm, body) = parse_frontmatter(raw);
        assert_eq!(fm, Frontmatter::default());
        assert_eq!(body, raw);
    }

    #[test]
    fn unknown_keys_land_in_extra() {
        let raw = "---\nreviewer: alice\n---\nbody\n";
        let (fm, _) = parse_frontmatter(raw);
        assert_eq!(fm.extra.get("reviewer").map(String::as_str), Some("alice"));
    }

    #[test]
    fn extracts_first_heading() {
        assert_eq!(first_heading("intro\n## Real Title\nmore"), Some("Real Title".to_string()));
        assert_eq!(first_heading("no heading here"), None);
    }
}
