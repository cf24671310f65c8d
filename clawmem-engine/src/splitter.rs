//! Fragment splitter (§4.3). Pure function: given a document body plus its
//! structured side-channels (frontmatter, observation facts/narrative), it
//! produces the ordered fragment list the indexer embeds. Never touches the
//! store or the network, so it is exercised directly by the tests below.

use std::collections::BTreeMap;

use clawmem_core::constants::{SPLITTER_INPUT_CHAR_CEILING, SPLITTER_MAX_FRAGMENTS, SPLITTER_MIN_SIZE_FOR_FRAGMENTS};
use clawmem_core::FragmentType;
use regex::Regex;

/// One splitter output row, ready to be embedded and inserted alongside the
/// whole-document `full` fragment at `seq = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    pub kind: FragmentType,
    pub label: Option<String>,
    pub pos: usize,
    pub text: String,
}

/// Structured side-channels the splitter folds in alongside the raw body.
#[derive(Debug, Clone, Default)]
pub struct SplitContext {
    pub frontmatter: BTreeMap<String, String>,
    pub observation_facts: Vec<String>,
    pub observation_narrative: Option<String>,
}

/// Split `body` into an ordered fragment list, beginning with `full`.
/// `body` is truncated to [`SPLITTER_INPUT_CHAR_CEILING`] characters before
/// any further processing, and the total fragment count (including `full`)
/// is capped at [`SPLITTER_MAX_FRAGMENTS`].
#[must_use]
pub fn split_document(body: &str, context: &SplitContext) -> Vec<Fragment> {
    let capped: String = if body.chars().count() > SPLITTER_INPUT_CHAR_CEILING {
        body.chars().take(SPLITTER_INPUT_CHAR_CEILING).collect()
    } else {
        body.to_string()
    };

    let mut fragments = vec![Fragment { kind: FragmentType::Full, label: None, pos: 0, text: capped.clone() }];

    if capped.chars().count() >= SPLITTER_MIN_SIZE_FOR_FRAGMENTS {
        fragments.extend(split_sections(&capped));
        fragments.extend(split_lists(&capped));
        fragments.extend(split_code_blocks(&capped));
    }

    for (key, value) in &context.frontmatter {
        fragments.push(Fragment {
            kind: FragmentType::Frontmatter,
            label: Some(key.clone()),
            pos: 0,
            text: format!("{key}: {value}"),
        });
    }

    for fact in &context.observation_facts {
        fragments.push(Fragment { kind: FragmentType::Fact, label: None, pos: 0, text: fact.clone() });
    }

    if let Some(narrative) = &context.observation_narrative {
        fragments.push(Fragment { kind: FragmentType::Narrative, label: None, pos: 0, text: narrative.clone() });
    }

    fragments.truncate(SPLITTER_MAX_FRAGMENTS);
    fragments
}

fn heading_regex() -> Regex {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+)$").unwrap()
}

/// `section`: text spanning each heading up to (but excluding) the next
/// heading of equal or shallower depth.
fn split_sections(body: &str) -> Vec<Fragment> {
    let re = heading_regex();
    let headings: Vec<_> = re.captures_iter(body).map(|c| {
        let m = c.get(0).expect("capture 0 always matches");
        (m.start(), c[1].len(), c[2].trim().to_string())
    }).collect();

    let mut out = Vec::new();
    for (i, (start, depth, title)) in headings.iter().enumerate() {
        let end = headings[i + 1..]
            .iter()
            .find(|(_, d, _)| d <= depth)
            .map_or(body.len(), |(s, _, _)| *s);
        let text = body[*start..end].trim().to_string();
        if !text.is_empty() {
            out.push(Fragment { kind: FragmentType::Section, label: Some(title.clone()), pos: *start, text });
        }
    }
    out
}

/// `list`: runs of two or more consecutive bullet/numbered lines.
fn split_lists(body: &str) -> Vec<Fragment> {
    #[allow(clippy::unwrap_used)]
    let bullet = Regex::new(r"^\s*([-*+]|\d+\.)\s+").unwrap();

    let mut out = Vec::new();
    let mut run_start: Option<usize> = None;
    let mut run_lines = 0usize;
    let mut offset = 0usize;

    let flush = |start: Option<usize>, end: usize, lines: usize, out: &mut Vec<Fragment>| {
        if lines >= 2 {
            if let Some(s) = start {
                let text = body[s..end].trim_end().to_string();
                if !text.is_empty() {
                    out.push(Fragment { kind: FragmentType::List, label: None, pos: s, text });
                }
            }
        }
    };

    for line in body.split_inclusive('\n') {
        let trimmed = line.trim_end_matches('\n');
        if bullet.is_match(trimmed) {
            if run_start.is_none() {
                run_start = Some(offset);
            }
            run_lines += 1;
        } else if !trimmed.trim().is_empty() {
            flush(run_start, offset, run_lines, &mut out);
            run_start = None;
            run_lines = 0;
        }
        offset += line.len();
    }
    flush(run_start, offset, run_lines, &mut out);
    out
}

/// `code`: fenced blocks delimited by matching ` ``` ` lines; label is the
/// language tag on the opening fence, if any.
fn split_code_blocks(body: &str) -> Vec<Fragment> {
    let mut out = Vec::new();
    let mut lines_with_pos = Vec::new();
    let mut offset = 0usize;
    for line in body.split_inclusive('\n') {
        lines_with_pos.push((offset, line));
        offset += line.len();
    }

    let mut i = 0;
    while i < lines_with_pos.len() {
        let (start_pos, line) = lines_with_pos[i];
        let trimmed = line.trim_end_matches('\n');
        if let Some(lang) = trimmed.trim_start().strip_prefix("```") {
            let label = if lang.trim().is_empty() { None } else { Some(lang.trim().to_string()) };
            if let Some(close) = lines_with_pos[i + 1..]
                .iter()
                .position(|(_, l)| l.trim_end_matches('\n').trim_start().starts_with("```"))
            {
                let (close_pos, close_line) = lines_with_pos[i + 1 + close];
                let end = close_pos + close_line.len();
                let text = body[start_pos..end].to_string();
                out.push(Fragment { kind: FragmentType::Code, label, pos: start_pos, text });
                i += close + 2;
                continue;
            }
        }
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> SplitContext {
        SplitContext::default()
    }

    #[test]
    fn short_body_only_yields_full() {
        let fragments = split_document("a short note", &ctx());
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].kind, FragmentType::Full);
    }

    #[test]
    fn splits_headings_into_sections() {
        let body = format!(
            "# Title\n\n{}\n\n## Sub\n\n{}\n",
            "x".repeat(600),
            "y".repeat(10)
        );
        let fragments = split_document(&body, &ctx());
        assert!(fragments.iter().any(|f| f.kind == FragmentType::Section && f.label.as_deref() == Some("Title")));
        assert!(fragments.iter().any(|f| f.kind == FragmentType::Section && f.label.as_deref() == Some("Sub")));
    }

    #[test]
    fn splits_consecutive_bullets_as_list() {
        let body = format!("{}\n- one\n- two\n- three\n", "padding ".repeat(80));
        let fragments = split_document(&body, &ctx());
        let list = fragments.iter().find(|f| f.kind == FragmentType::List).expect("list fragment");
        assert!(list.text.contains("- one"));
        assert!(list.text.contains("- three"));
    }

    #[test]
    fn single_bullet_is_not_a_list() {
        let body = format!("{}\n- only one\n\nmore text here.\n", "padding ".repeat(80));
        let fragments = split_document(&body, &ctx());
        assert!(!fragments.iter().any(|f| f.kind == FragmentType::List));
    }

    #[test]
    fn splits_fenced_code_block() {
        let body = format!("{}\n```rust\nfn main() {{}}\n```\n", "padding ".repeat(80));
        let fragments = split_document(&body, &ctx());
        let code = fragments.iter().find(|f| f.kind == FragmentType::Code).expect("code fragment");
        assert_eq!(code.label.as_deref(), Some("rust"));
        assert!(code.text.contains("fn main"));
    }

    #[test]
    fn frontmatter_keys_become_fragments() {
        let mut context = ctx();
        context.frontmatter.insert("domain".to_string(), "backend".to_string());
        let fragments = split_document("tiny", &context);
        assert!(fragments.iter().any(|f| f.kind == FragmentType::Frontmatter && f.label.as_deref() == Some("domain")));
    }

    #[test]
    fn observation_facts_and_narrative_become_fragments() {
        let mut context = ctx();
        context.observation_facts = vec!["fact one".to_string(), "fact two".to_string()];
        context.observation_narrative = Some("a short narrative".to_string());
        let fragments = split_document("tiny", &context);
        assert_eq!(fragments.iter().filter(|f| f.kind == FragmentType::Fact).count(), 2);
        assert!(fragments.iter().any(|f| f.kind == FragmentType::Narrative));
    }

    #[test]
    fn caps_total_fragment_count() {
        let mut context = ctx();
        for i in 0..100 {
            context.frontmatter.insert(format!("key{i:03}"), "v".to_string());
        }
        let fragments = split_document("tiny", &context);
        assert_eq!(fragments.len(), SPLITTER_MAX_FRAGMENTS);
    }

    #[test]
    fn truncates_oversized_input() {
        let huge = "a".repeat(SPLITTER_INPUT_CHAR_CEILING + 1000);
        let fragments = split_document(&huge, &ctx());
        assert_eq!(fragments[0].text.chars().count(), SPLITTER_INPUT_CHAR_CEILING);
    }
}
