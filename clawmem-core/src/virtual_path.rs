//! The `clawmem://{collection}/{relative_path}` addressing scheme and short
//! docid helpers (§6, §8 property 9/10).

use crate::error::{Error, Result};

const SCHEME: &str = "clawmem://";

/// Build a canonical virtual path from a collection name and a relative path.
#[must_use]
pub fn build_virtual_path(collection: &str, path: &str) -> String {
    format!("{SCHEME}{collection}/{}", path.trim_start_matches('/'))
}

/// Parse a virtual path into `(collection, path)`, normalizing the `clawmem:`
/// prefix, repeated slashes, and a leading `//collection/path` form missing
/// the scheme's colon-slash-slash. `:N` line-anchor suffixes are stripped and
/// returned separately.
///
/// # Errors
/// Returns [`Error::InvalidPath`] if the input has no collection segment.
pub fn parse_virtual_path(input: &str) -> Result<(String, String, Option<u32>)> {
    let mut rest = input.trim();

    rest = rest
        .strip_prefix(SCHEME)
        .or_else(|| rest.strip_prefix("clawmem:"))
        .unwrap_or(rest);
    rest = rest.trim_start_matches('/');

    if rest.is_empty() {
        return Err(Error::InvalidPath(input.to_string()));
    }

    let normalized = collapse_slashes(rest);
    let mut parts = normalized.splitn(2, '/');
    let collection = parts
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::InvalidPath(input.to_string()))?
        .to_string();
    let path_with_anchor = parts.next().unwrap_or_default();

    let (path, anchor) = split_line_anchor(path_with_anchor);
    if path.is_empty() {
        return Err(Error::InvalidPath(input.to_string()));
    }

    Ok((collection, path, anchor))
}

fn collapse_slashes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_slash = false;
    for c in s.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    out
}

/// Split a trailing `:N` line-anchor suffix off a path, e.g. `notes/x.md:42`.
fn split_line_anchor(path: &str) -> (String, Option<u32>) {
    if let Some((head, tail)) = path.rsplit_once(':') {
        if let Ok(n) = tail.parse::<u32>() {
            return (head.to_string(), Some(n));
        }
    }
    (path.to_string(), None)
}

/// Short docid: the first 6 hex characters of a content hash (§6, glossary).
#[must_use]
pub fn short_docid(hash: &str) -> String {
    hash.chars().take(6).collect()
}

/// Strip an optional leading `#` from a user-supplied short docid reference.
#[must_use]
pub fn strip_docid_marker(input: &str) -> &str {
    input.strip_prefix('#').unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn round_trips_simple_path() {
        let vp = build_virtual_path("notes", "decision-sqlite.md");
        let (c, p, anchor) = parse_virtual_path(&vp).unwrap();
        assert_eq!(c, "notes");
        assert_eq!(p, "decision-sqlite.md");
        assert_eq!(anchor, None);
    }

    #[test]
    fn normalizes_extra_slashes_and_missing_colon() {
        let (c, p, _) = parse_virtual_path("//notes//decision-sqlite.md").unwrap();
        assert_eq!(c, "notes");
        assert_eq!(p, "decision-sqlite.md");
    }

    #[test]
    fn normalizes_bare_scheme_prefix() {
        let (c, p, _) = parse_virtual_path("clawmem:notes/x.md").unwrap();
        assert_eq!(c, "notes");
        assert_eq!(p, "x.md");
    }

    #[test]
    fn parses_line_anchor() {
        let (_, p, anchor) = parse_virtual_path("clawmem://notes/x.md:42").unwrap();
        assert_eq!(p, "x.md");
        assert_eq!(anchor, Some(42));
    }

    #[test]
    fn rejects_empty_input() {
        assert!(parse_virtual_path("clawmem://").is_err());
    }

    #[test]
    fn short_docid_takes_first_six() {
        assert_eq!(short_docid("abc123def456"), "abc123");
    }

    proptest! {
        /// §8 property 9: for any path in an indexed collection,
        /// parse(build(c, p)) == (c, p).
        #[test]
        fn prop_virtual_path_round_trips(
            collection in "[a-z][a-z0-9_-]{0,15}",
            path in "[a-z0-9_-]{1,10}(/[a-z0-9_-]{1,10}){0,3}\\.md",
        ) {
            let vp = build_virtual_path(&collection, &path);
            let (c, p, _) = parse_virtual_path(&vp).unwrap();
            prop_assert_eq!(c, collection);
            prop_assert_eq!(p, path);
        }
    }
}
