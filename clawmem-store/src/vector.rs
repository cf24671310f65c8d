use std::collections::HashMap;

use clawmem_core::types::FragmentType;
use clawmem_core::Result;

use crate::content::now_secs;
use crate::documents::row_to_document;
use crate::store::{store_err, Store};
use crate::Document;

/// One vector-search match, after per-document dedup (§4.7).
#[derive(Debug, Clone)]
pub struct VecHit {
    pub document: Document,
    /// `1.0 - cosine_distance`, i.e. cosine similarity in `[-1, 1]`.
    pub score: f64,
    pub fragment_type: FragmentType,
    pub fragment_label: Option<String>,
}

impl Store {
    /// Persist one fragment embedding.
    #[allow(clippy::too_many_arguments)]
    pub async fn insert_embedding(
        &self,
        hash: &str,
        seq: u32,
        pos: usize,
        model: &str,
        fragment_type: FragmentType,
        fragment_label: Option<&str>,
        vector: &[f32],
    ) -> Result<()> {
        self.ensure_vector_table(vector.len()).await?;
        let conn = self.conn().await?;
        let vector_literal = vector_json(vector);
        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO embeddings \
                 (hash, seq, pos, model, embedded_at, fragment_type, fragment_label, vector) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, vector32('{vector_literal}'))"
            ),
            libsql::params![
                hash,
                seq,
                pos as i64,
                model,
                now_secs(),
                fragment_type.as_str(),
                fragment_label,
            ],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// k-NN vector search, deduplicated to the closest fragment per active
    /// document (§4.7: "multiple fragments of the same document collapse to
    /// the single closest one"). Over-fetches `3 * limit` rows from the
    /// vector index before joining and deduping, since the top-k by raw
    /// distance may include several fragments of the same handful of
    /// documents.
    ///
    /// The vector virtual table is never joined against `documents` in the
    /// same query: `vector_top_k` resolves first and its result set is
    /// dictionary-joined here, in a second query, against `embeddings` and
    /// `documents` — joining directly in one query silently returns no rows
    /// on libSQL.
    pub async fn search_vec(&self, query_vector: &[f32], limit: usize, collection: Option<&str>) -> Result<Vec<VecHit>> {
        self.ensure_vector_table(query_vector.len()).await?;
        let conn = self.conn().await?;
        let vector_literal = vector_json(query_vector);
        let over_fetch = (limit * 3).max(limit);

        let mut knn_rows = conn
            .query(
                &format!(
                    "SELECT id FROM vector_top_k('embeddings_vec_idx', vector32('{vector_literal}'), ?1)"
                ),
                libsql::params![over_fetch as i64],
            )
            .await
            .map_err(store_err)?;

        let mut rowids = Vec::new();
        while let Some(row) = knn_rows.next().await.map_err(store_err)? {
            let id: i64 = row.get(0).map_err(store_err)?;
            rowids.push(id);
        }
        if rowids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = rowids.iter().map(|_| "?").collect::<Vec<_>>().join(", ");
        let collection_clause = if collection.is_some() { " AND d.collection = ?" } else { "" };
        let sql = format!(
            "SELECT d.*, e.fragment_type, e.fragment_label, \
             vector_distance_cos(e.vector, vector32('{vector_literal}')) AS distance \
             FROM embeddings e \
             JOIN documents d ON d.hash = e.hash \
             WHERE e.rowid IN ({placeholders}) AND d.active = 1{collection_clause}"
        );
        let mut params: Vec<libsql::Value> = rowids.iter().map(|id| libsql::Value::Integer(*id)).collect();
        if let Some(collection) = collection {
            params.push(libsql::Value::Text(collection.to_string()));
        }
        let mut rows = conn.query(&sql, params).await.map_err(store_err)?;

        let mut best_per_doc: HashMap<i64, VecHit> = HashMap::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            let document = row_to_document(&row)?;
            let field_count = 25;
            let fragment_type_raw: String = row.get(field_count).map_err(store_err)?;
            let fragment_label: Option<String> = row.get(field_count + 1).map_err(store_err)?;
            let distance: f64 = row.get(field_count + 2).map_err(store_err)?;
            let score = 1.0 - distance;
            let fragment_type = parse_fragment_type(&fragment_type_raw);

            best_per_doc
                .entry(document.id)
                .and_modify(|existing| {
                    if score > existing.score {
                        *existing = VecHit {
                            document: document.clone(),
                            score,
                            fragment_type,
                            fragment_label: fragment_label.clone(),
                        };
                    }
                })
                .or_insert(VecHit {
                    document,
                    score,
                    fragment_type,
                    fragment_label,
                });
        }

        let mut hits: Vec<VecHit> = best_per_doc.into_values().collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    /// Fetch back a single fragment's embedding vector, used as the seed
    /// vector for A-MEM neighbor search (§4.4) and the semantic graph builder
    /// (§4.5), both of which need "the nearest neighbors of this document",
    /// not an arbitrary query string.
    pub async fn get_embedding_vector(&self, hash: &str, seq: u32) -> Result<Option<Vec<f32>>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT vector_extract(vector) FROM embeddings WHERE hash = ?1 AND seq = ?2",
                libsql::params![hash, seq],
            )
            .await
            .map_err(store_err)?;
        match rows.next().await.map_err(store_err)? {
            Some(row) => {
                let raw: String = row.get(0).map_err(store_err)?;
                let floats: Vec<f32> = serde_json::from_str(&raw).map_err(store_err)?;
                Ok(Some(floats))
            }
            None => Ok(None),
        }
    }

    /// Remove embeddings for a content hash, used when content is garbage
    /// collected.
    pub async fn cleanup_orphaned_vectors(&self) -> Result<u64> {
        let conn = self.conn().await?;
        let changed = conn
            .execute(
                "DELETE FROM embeddings WHERE hash NOT IN (SELECT hash FROM documents)",
                (),
            )
            .await
            .map_err(store_err)?;
        Ok(changed)
    }
}

fn vector_json(vector: &[f32]) -> String {
    let parts: Vec<String> = vector.iter().map(|v| v.to_string()).collect();
    format!("[{}]", parts.join(","))
}

fn parse_fragment_type(raw: &str) -> FragmentType {
    match raw {
        "section" => FragmentType::Section,
        "list" => FragmentType::List,
        "code" => FragmentType::Code,
        "frontmatter" => FragmentType::Frontmatter,
        "fact" => FragmentType::Fact,
        "narrative" => FragmentType::Narrative,
        _ => FragmentType::Full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_json_formats_floats() {
        assert_eq!(vector_json(&[1.0, 0.5, -2.0]), "[1,0.5,-2]");
    }

    #[test]
    fn unknown_fragment_type_defaults_to_full() {
        assert_eq!(parse_fragment_type("bogus"), FragmentType::Full);
        assert_eq!(parse_fragment_type("fact"), FragmentType::Fact);
    }
}
