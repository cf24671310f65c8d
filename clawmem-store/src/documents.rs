use std::str::FromStr;

use clawmem_core::types::{ContentType, Document};
use clawmem_core::Result;
use libsql::Row;

use crate::content::now_secs;
use crate::store::{store_err, Store};

/// Which branch [`Store::upsert_document`] took (§8 invariant 2: "indexing
/// the same `(collection, path)` twice reactivates or updates in place, it
/// never duplicates").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No row existed for `(collection, path)`; one was created.
    Inserted,
    /// A row existed but was inactive (previously deleted from disk); it was
    /// reactivated and its content updated.
    Reactivated,
    /// A row existed, was already active, and its body hash differed, so its
    /// content and metadata were refreshed in place.
    Updated,
    /// A row existed, was already active, and its body hash was unchanged;
    /// nothing was written.
    Unchanged,
}

pub struct UpsertRequest<'a> {
    pub collection: &'a str,
    pub path: &'a str,
    pub title: &'a str,
    pub hash: &'a str,
    pub content_hash: &'a str,
    pub content_type: ContentType,
    pub domain: Option<&'a str>,
    pub workstream: Option<&'a str>,
    pub tags: &'a [String],
}

impl Store {
    /// Insert, reactivate, or update a document row, keeping `(collection,
    /// path)` unique (§8 invariant 2). Returns the resulting id and which
    /// branch was taken.
    pub async fn upsert_document(&self, req: UpsertRequest<'_>) -> Result<(i64, UpsertOutcome)> {
        let conn = self.conn().await?;
        let existing = self.find_by_collection_path(req.collection, req.path).await?;
        let now = now_secs();
        let tags_json = serde_json::to_string(req.tags).map_err(store_err)?;

        match existing {
            None => {
                conn.execute(
                    "INSERT INTO documents \
                     (collection, path, title, hash, created_at, modified_at, active, \
                      content_type, domain, workstream, tags, confidence, access_count, content_hash, \
                      files_read, files_modified) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?5, 1, ?6, ?7, ?8, ?9, 0.5, 0, ?10, '[]', '[]')",
                    libsql::params![
                        req.collection,
                        req.path,
                        req.title,
                        req.hash,
                        now,
                        req.content_type.as_str(),
                        req.domain,
                        req.workstream,
                        tags_json,
                        req.content_hash,
                    ],
                )
                .await
                .map_err(store_err)?;
                let id = conn.last_insert_rowid();
                Ok((id, UpsertOutcome::Inserted))
            }
            Some((id, active, content_hash)) => {
                if active && content_hash == req.content_hash {
                    return Ok((id, UpsertOutcome::Unchanged));
                }
                conn.execute(
                    "UPDATE documents SET title = ?1, hash = ?2, modified_at = ?3, active = 1, \
                     content_type = ?4, domain = ?5, workstream = ?6, tags = ?7, content_hash = ?8 \
                     WHERE id = ?9",
                    libsql::params![
                        req.title,
                        req.hash,
                        now,
                        req.content_type.as_str(),
                        req.domain,
                        req.workstream,
                        tags_json,
                        req.content_hash,
                        id,
                    ],
                )
                .await
                .map_err(store_err)?;
                let outcome = if active {
                    UpsertOutcome::Updated
                } else {
                    UpsertOutcome::Reactivated
                };
                Ok((id, outcome))
            }
        }
    }

    async fn find_by_collection_path(
        &self,
        collection: &str,
        path: &str,
    ) -> Result<Option<(i64, bool, String)>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT id, active, content_hash FROM documents WHERE collection = ?1 AND path = ?2",
                libsql::params![collection, path],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => {
                let id: i64 = row.get(0).map_err(store_err)?;
                let active: i64 = row.get(1).map_err(store_err)?;
                let content_hash: String = row.get(2).map_err(store_err)?;
                Ok(Some((id, active != 0, content_hash)))
            }
            None => Ok(None),
        }
    }

    /// Mark a document inactive (the file disappeared from disk). Content
    /// and embeddings are left intact for possible reactivation; orphan
    /// cleanup is a separate maintenance step (§4.10).
    pub async fn deactivate_document(&self, id: i64) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE documents SET active = 0, modified_at = ?1 WHERE id = ?2",
            libsql::params![now_secs(), id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// Fetch a document by its primary key.
    pub async fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT * FROM documents WHERE id = ?1", libsql::params![id])
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => Ok(Some(row_to_document(&row)?)),
            None => Ok(None),
        }
    }

    /// Increment access_count for a document, used by the feedback loop
    /// (§4.11) when a transcript mentions it.
    pub async fn record_access(&self, id: i64) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "UPDATE documents SET access_count = access_count + 1 WHERE id = ?1",
            libsql::params![id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// Set a document's A-MEM note fields directly (§4.4 "construct note").
    /// Unlike [`Store::apply_evolution`], this does not append an evolution
    /// record — it is the note's first write, or a non-evolving refresh.
    pub async fn set_note(
        &self,
        id: i64,
        keywords: &[String],
        tags: &[String],
        context: &str,
    ) -> Result<()> {
        let conn = self.conn().await?;
        let keywords_json = serde_json::to_string(keywords).map_err(store_err)?;
        let tags_json = serde_json::to_string(tags).map_err(store_err)?;
        conn.execute(
            "UPDATE documents SET amem_keywords = ?1, amem_tags = ?2, amem_context = ?3 WHERE id = ?4",
            libsql::params![keywords_json, tags_json, context, id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// All active documents in a single collection, used by the indexer's
    /// post-walk deletion pass (§4.3).
    pub async fn active_documents_in_collection(&self, collection: &str) -> Result<Vec<Document>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE collection = ?1 AND active = 1",
                libsql::params![collection],
            )
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(row_to_document(&row)?);
        }
        Ok(out)
    }

    /// All active documents across every collection, ordered by creation
    /// time, used by the graph builder's temporal backbone (§4.5) and the
    /// consolidation worker (§4.10).
    pub async fn active_documents(&self) -> Result<Vec<Document>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query("SELECT * FROM documents WHERE active = 1 ORDER BY created_at ASC", ())
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(row_to_document(&row)?);
        }
        Ok(out)
    }

    /// Up to `limit` active documents with no A-MEM note yet, oldest first,
    /// used by the consolidation worker (§4.10).
    pub async fn documents_missing_notes(&self, limit: usize) -> Result<Vec<Document>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT * FROM documents WHERE active = 1 AND amem_keywords IS NULL \
                 ORDER BY created_at ASC LIMIT ?1",
                libsql::params![limit as i64],
            )
            .await
            .map_err(store_err)?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            out.push(row_to_document(&row)?);
        }
        Ok(out)
    }
}

fn json_string_vec(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn json_string_vec_opt(raw: Option<String>) -> Option<Vec<String>> {
    raw.and_then(|s| serde_json::from_str(&s).ok())
}

pub(crate) fn row_to_document(row: &Row) -> Result<Document> {
    use chrono::{TimeZone, Utc};

    let get_i64 = |idx: i32| -> Result<i64> { row.get(idx).map_err(store_err) };
    let get_str = |idx: i32| -> Result<String> { row.get(idx).map_err(store_err) };
    let get_opt_str = |idx: i32| -> Result<Option<String>> { row.get(idx).map_err(store_err) };
    let get_f64 = |idx: i32| -> Result<f64> { row.get(idx).map_err(store_err) };

    let ts = |secs: i64| Utc.timestamp_opt(secs, 0).single().unwrap_or_else(Utc::now);

    Ok(Document {
        id: get_i64(0)?,
        collection: get_str(1)?,
        path: get_str(2)?,
        title: get_str(3)?,
        hash: get_str(4)?,
        created_at: ts(get_i64(5)?),
        modified_at: ts(get_i64(6)?),
        active: get_i64(7)? != 0,
        content_type: ContentType::from_str(&get_str(8)?).unwrap_or(ContentType::Other),
        domain: get_opt_str(9)?,
        workstream: get_opt_str(10)?,
        tags: json_string_vec(&get_str(11)?),
        review_by: row
            .get::<Option<i64>>(12)
            .map_err(store_err)?
            .map(ts),
        confidence: get_f64(13)?,
        access_count: get_i64(14)?.max(0) as u64,
        content_hash: get_str(15)?,
        amem_keywords: json_string_vec_opt(get_opt_str(16)?),
        amem_tags: json_string_vec_opt(get_opt_str(17)?),
        amem_context: get_opt_str(18)?,
        observation_type: get_opt_str(19)?,
        observation_facts: json_string_vec_opt(get_opt_str(20)?),
        observation_narrative: get_opt_str(21)?,
        observation_concepts: json_string_vec_opt(get_opt_str(22)?),
        files_read: json_string_vec(&get_str(23)?),
        files_modified: json_string_vec(&get_str(24)?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req<'a>(path: &'a str, content_hash: &'a str) -> UpsertRequest<'a> {
        UpsertRequest {
            collection: "notes",
            path,
            title: "Title",
            hash: "body-hash",
            content_hash,
            content_type: ContentType::Note,
            domain: None,
            workstream: None,
            tags: &[],
        }
    }

    #[tokio::test]
    async fn first_upsert_inserts() {
        let store = Store::open_in_memory().await.unwrap();
        let (id, outcome) = store.upsert_document(req("a.md", "c1")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Inserted);
        assert!(id > 0);
    }

    #[tokio::test]
    async fn same_content_is_unchanged() {
        let store = Store::open_in_memory().await.unwrap();
        store.upsert_document(req("a.md", "c1")).await.unwrap();
        let (_, outcome) = store.upsert_document(req("a.md", "c1")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Unchanged);
    }

    #[tokio::test]
    async fn changed_content_updates() {
        let store = Store::open_in_memory().await.unwrap();
        store.upsert_document(req("a.md", "c1")).await.unwrap();
        let (_, outcome) = store.upsert_document(req("a.md", "c2")).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);
    }

    #[tokio::test]
    async fn deactivated_document_reactivates_instead_of_duplicating() {
        let store = Store::open_in_memory().await.unwrap();
        let (id, _) = store.upsert_document(req("a.md", "c1")).await.unwrap();
        store.deactivate_document(id).await.unwrap();
        let (id2, outcome) = store.upsert_document(req("a.md", "c2")).await.unwrap();
        assert_eq!(id, id2);
        assert_eq!(outcome, UpsertOutcome::Reactivated);
    }

    #[tokio::test]
    async fn get_document_round_trips_fields() {
        let store = Store::open_in_memory().await.unwrap();
        let (id, _) = store.upsert_document(req("a.md", "c1")).await.unwrap();
        let doc = store.get_document(id).await.unwrap().unwrap();
        assert_eq!(doc.path, "a.md");
        assert_eq!(doc.content_type, ContentType::Note);
        assert!(doc.active);
        assert!(!doc.is_enriched());
    }
}
