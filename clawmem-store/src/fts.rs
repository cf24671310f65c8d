use clawmem_core::Result;

use crate::documents::row_to_document;
use crate::store::{store_err, Store};
use crate::Document;

/// One FTS5 match (§4.7 lexical leg of retrieval).
#[derive(Debug, Clone)]
pub struct FtsHit {
    pub document: Document,
    /// Mapped from SQLite's raw (negative, unbounded) `bm25()` score into
    /// `(0, 1]` via `1 / (1 + bm25.max(0.0))`, so it composes with the
    /// vector leg's cosine similarity on the same scale (§4.7, §4.8).
    pub score: f64,
}

impl Store {
    /// Run an FTS5 query over active documents, weighting `path`/`title`
    /// matches above `body` matches (§4.7: "title and path matches rank
    /// above body matches"). `query` is tokenized into `[a-z0-9]+` terms,
    /// lowercased, each wrapped with a prefix-match operator, and combined
    /// with conjunction before being handed to FTS5's MATCH syntax — a raw
    /// user query is never passed through verbatim, so an FTS5 metacharacter
    /// or bare operator (`"`, `*`, `(`, `AND`, ...) in the input can't raise
    /// a syntax error.
    pub async fn search_fts(&self, query: &str, limit: usize, collection: Option<&str>) -> Result<Vec<FtsHit>> {
        let match_query = build_match_query(query);
        if match_query.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn().await?;
        let mut rows = if let Some(collection) = collection {
            conn.query(
                "SELECT d.*, bm25(documents_fts, 10.0, 8.0, 1.0) AS score \
                 FROM documents_fts \
                 JOIN documents d ON d.id = documents_fts.rowid \
                 WHERE documents_fts MATCH ?1 AND d.active = 1 AND d.collection = ?3 \
                 ORDER BY score LIMIT ?2",
                libsql::params![match_query, limit as i64, collection],
            )
            .await
            .map_err(store_err)?
        } else {
            conn.query(
                "SELECT d.*, bm25(documents_fts, 10.0, 8.0, 1.0) AS score \
                 FROM documents_fts \
                 JOIN documents d ON d.id = documents_fts.rowid \
                 WHERE documents_fts MATCH ?1 AND d.active = 1 \
                 ORDER BY score LIMIT ?2",
                libsql::params![match_query, limit as i64],
            )
            .await
            .map_err(store_err)?
        };

        let mut hits = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            let document = row_to_document(&row)?;
            let field_count = document_field_count();
            let raw_bm25: f64 = row.get(field_count).map_err(store_err)?;
            let score = 1.0 / (1.0 + raw_bm25.max(0.0));
            hits.push(FtsHit { document, score });
        }
        Ok(hits)
    }
}

/// Tokenize into FTS5 MATCH syntax: split on anything that isn't an ASCII
/// letter or digit, lowercase each term, append a prefix-match `*`, and
/// conjoin with `AND`. An empty result means the query had no indexable
/// terms at all (e.g. pure punctuation).
fn build_match_query(query: &str) -> String {
    query
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("{}*", term.to_ascii_lowercase()))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// Number of columns in `documents` selected by `d.*`, i.e. the index of the
/// trailing `bm25(...) AS score` column in the combined row.
const fn document_field_count() -> i32 {
    25
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::UpsertRequest;
    use clawmem_core::types::ContentType;

    async fn seeded() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("the quick brown fox jumps").await.unwrap();
        store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "fox.md",
                title: "Quick Fox",
                hash: &hash,
                content_hash: "c1",
                content_type: ContentType::Note,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn matches_title_and_body_terms() {
        let store = seeded().await;
        let hits = store.search_fts("fox", 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits[0].score > 0.0);
    }

    #[tokio::test]
    async fn prefix_match_finds_a_longer_word() {
        let store = seeded().await;
        let hits = store.search_fts("qui", 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn metacharacters_do_not_raise_a_syntax_error() {
        let store = seeded().await;
        let hits = store.search_fts("\"fox\" AND (bar) OR -baz^2", 10, None).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn collection_filter_excludes_other_collections() {
        let store = seeded().await;
        let hits = store.search_fts("fox", 10, Some("other")).await.unwrap();
        assert!(hits.is_empty());
        let hits = store.search_fts("fox", 10, Some("notes")).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn empty_query_returns_nothing() {
        let store = seeded().await;
        let hits = store.search_fts("   ", 10, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn punctuation_only_query_returns_nothing() {
        let store = seeded().await;
        let hits = store.search_fts("---", 10, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn non_matching_query_returns_nothing() {
        let store = seeded().await;
        let hits = store.search_fts("nonexistentterm", 10, None).await.unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn build_match_query_tokenizes_lowercases_and_conjoins() {
        assert_eq!(build_match_query("SQLi Injection"), "sqli* AND injection*");
        assert_eq!(build_match_query("  "), "");
        assert_eq!(build_match_query("sqli"), "sqli*");
    }
}
