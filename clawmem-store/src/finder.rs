use clawmem_core::constants::{
    FIND_DOCUMENTS_BYTE_CAP, FUZZY_PATH_SUGGESTION_FLOOR, FUZZY_PATH_SUGGESTION_LIMIT,
};
use clawmem_core::virtual_path::{parse_virtual_path, strip_docid_marker};
use clawmem_core::Result;

use crate::documents::row_to_document;
use crate::store::{store_err, Store};
use crate::Document;

/// A resolved `find_document` match, carrying the optional `:N` line anchor
/// parsed off a virtual path reference (§6).
#[derive(Debug, Clone)]
pub struct FoundDocument {
    pub document: Document,
    pub line_anchor: Option<u32>,
}

/// One entry of a `find_documents` batch lookup (§4.1 finder: "glob/csv
/// input, byte-capped output").
#[derive(Debug, Clone)]
pub enum FindDocumentsItem {
    Found(Document),
    /// Matched a pattern but was skipped because the cumulative byte budget
    /// for this call was already exhausted.
    Skipped { path: String, reason: String },
}

impl Store {
    /// Resolve a single reference: virtual path (`clawmem://collection/path`
    /// or bare `collection/path`), `#`-prefixed short docid, or a fuzzy
    /// fallback over active document paths when no exact match exists.
    ///
    /// # Errors
    /// [`clawmem_core::Error::NotFound`] carrying up to
    /// [`FUZZY_PATH_SUGGESTION_LIMIT`] path suggestions when nothing matches
    /// closely enough.
    pub async fn find_document(&self, reference: &str) -> Result<FoundDocument> {
        let trimmed = reference.trim();

        if let Some(docid) = trimmed.strip_prefix('#') {
            if let Some(doc) = self.find_by_docid_prefix(strip_docid_marker(docid)).await? {
                return Ok(FoundDocument { document: doc, line_anchor: None });
            }
        } else if let Ok((collection, path, anchor)) = parse_virtual_path(trimmed) {
            if let Some(doc) = self.find_active_by_collection_path(&collection, &path).await? {
                return Ok(FoundDocument { document: doc, line_anchor: anchor });
            }
        }

        self.fuzzy_find(trimmed).await
    }

    async fn find_active_by_collection_path(
        &self,
        collection: &str,
        path: &str,
    ) -> Result<Option<Document>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE collection = ?1 AND path = ?2 AND active = 1",
                libsql::params![collection, path],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn find_by_docid_prefix(&self, prefix: &str) -> Result<Option<Document>> {
        if prefix.is_empty() {
            return Ok(None);
        }
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE active = 1 AND hash LIKE ?1 ORDER BY id LIMIT 1",
                libsql::params![format!("{prefix}%")],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    async fn fuzzy_find(&self, reference: &str) -> Result<FoundDocument> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT * FROM documents WHERE active = 1", ())
            .await
            .map_err(store_err)?;

        let mut scored: Vec<(f64, Document)> = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            let doc = row_to_document(&row)?;
            let score = strsim::normalized_levenshtein(reference, &doc.path);
            scored.push((score, doc));
        }
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        if let Some((score, doc)) = scored.first() {
            if *score >= FUZZY_PATH_SUGGESTION_FLOOR && scored.iter().filter(|(s, _)| *s == *score).count() == 1
            {
                return Ok(FoundDocument { document: doc.clone(), line_anchor: None });
            }
        }

        let suggestions = scored
            .into_iter()
            .filter(|(score, _)| *score >= FUZZY_PATH_SUGGESTION_FLOOR)
            .take(FUZZY_PATH_SUGGESTION_LIMIT)
            .map(|(_, doc)| doc.path)
            .collect();

        Err(clawmem_core::Error::not_found(
            format!("no document matches '{reference}'"),
            suggestions,
        ))
    }

    /// Resolve a batch of glob or literal path patterns against active
    /// documents, capping the cumulative returned body size at
    /// [`FIND_DOCUMENTS_BYTE_CAP`]; matches beyond the cap are reported as
    /// [`FindDocumentsItem::Skipped`] rather than silently dropped.
    pub async fn find_documents(&self, patterns: &[String]) -> Result<Vec<FindDocumentsItem>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT * FROM documents WHERE active = 1 ORDER BY path ASC", ())
            .await
            .map_err(store_err)?;

        let mut all = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            all.push(row_to_document(&row)?);
        }

        let mut budget = FIND_DOCUMENTS_BYTE_CAP;
        let mut out = Vec::new();
        for doc in all {
            if !patterns.iter().any(|p| glob_match(p, &doc.path)) {
                continue;
            }
            let size = self.get_content(&doc.hash).await?.map_or(0, |b| b.len());
            if size > budget {
                out.push(FindDocumentsItem::Skipped {
                    path: doc.path,
                    reason: "byte cap exceeded for this call".to_string(),
                });
                continue;
            }
            budget -= size;
            out.push(FindDocumentsItem::Found(doc));
        }
        Ok(out)
    }
}

/// Minimal glob matcher supporting `*` (any run of characters) and `?` (any
/// single character); a pattern with no wildcard is a literal path match.
fn glob_match(pattern: &str, candidate: &str) -> bool {
    if !pattern.contains(['*', '?']) {
        return pattern == candidate;
    }
    glob_match_bytes(pattern.as_bytes(), candidate.as_bytes())
}

fn glob_match_bytes(pattern: &[u8], text: &[u8]) -> bool {
    match (pattern.first(), text.first()) {
        (None, None) => true,
        (Some(b'*'), _) => {
            glob_match_bytes(&pattern[1..], text)
                || (!text.is_empty() && glob_match_bytes(pattern, &text[1..]))
        }
        (Some(b'?'), Some(_)) => glob_match_bytes(&pattern[1..], &text[1..]),
        (Some(p), Some(t)) if p == t => glob_match_bytes(&pattern[1..], &text[1..]),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::UpsertRequest;
    use clawmem_core::types::ContentType;

    #[test]
    fn glob_matches_wildcard_suffix() {
        assert!(glob_match("notes/*.md", "notes/a.md"));
        assert!(!glob_match("notes/*.md", "other/a.md"));
    }

    #[test]
    fn glob_literal_requires_exact_match() {
        assert!(glob_match("notes/a.md", "notes/a.md"));
        assert!(!glob_match("notes/a.md", "notes/b.md"));
    }

    async fn seeded() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("body").await.unwrap();
        store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "decision-sqlite.md",
                title: "Decision",
                hash: &hash,
                content_hash: "c1",
                content_type: ContentType::Decision,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn finds_exact_virtual_path() {
        let store = seeded().await;
        let found = store
            .find_document("clawmem://notes/decision-sqlite.md")
            .await
            .unwrap();
        assert_eq!(found.document.path, "decision-sqlite.md");
    }

    #[tokio::test]
    async fn finds_by_short_docid() {
        let store = seeded().await;
        let doc = store.get_document(1).await.unwrap().unwrap();
        let docid = clawmem_core::virtual_path::short_docid(&doc.hash);
        let found = store.find_document(&format!("#{docid}")).await.unwrap();
        assert_eq!(found.document.id, doc.id);
    }

    #[tokio::test]
    async fn close_typo_resolves_via_fuzzy_fallback() {
        let store = seeded().await;
        let found = store
            .find_document("clawmem://notes/decison-sqlite.md")
            .await
            .unwrap();
        assert_eq!(found.document.path, "decision-sqlite.md");
    }

    #[tokio::test]
    async fn unrelated_reference_returns_not_found_with_suggestions() {
        let store = seeded().await;
        let err = store.find_document("clawmem://other/zzz-unrelated-xyz.md").await;
        assert!(matches!(err, Err(clawmem_core::Error::NotFound { .. })));
    }

    #[tokio::test]
    async fn find_documents_matches_glob() {
        let store = seeded().await;
        let items = store
            .find_documents(&["notes/*.md".to_string()])
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], FindDocumentsItem::Found(_)));
    }
}
