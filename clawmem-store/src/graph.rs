use clawmem_core::types::RelationEdge;
use clawmem_core::Result;

use crate::content::now_secs;
use crate::store::{store_err, Store};

impl Store {
    /// Insert a relation edge, ignoring the call if `(source, target,
    /// relation_type)` already exists (§4.5: "graph construction is
    /// idempotent, re-running it must not duplicate edges or accumulate
    /// weight").
    pub async fn insert_edge(
        &self,
        source_id: i64,
        target_id: i64,
        relation_type: &str,
        weight: f64,
        metadata: &serde_json::Value,
    ) -> Result<()> {
        let conn = self.conn().await?;
        let metadata_json = serde_json::to_string(metadata).map_err(store_err)?;
        conn.execute(
            "INSERT OR IGNORE INTO relation_edges \
             (source_id, target_id, relation_type, weight, metadata, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            libsql::params![source_id, target_id, relation_type, weight, metadata_json, now_secs()],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }

    /// Outgoing edges from `source_id`, optionally filtered to a single
    /// relation type. Used by graph traversal's beam search (§4.7).
    pub async fn edges_from(
        &self,
        source_id: i64,
        relation_type: Option<&str>,
    ) -> Result<Vec<RelationEdge>> {
        let conn = self.conn().await?;
        let mut rows = match relation_type {
            Some(rt) => conn
                .query(
                    "SELECT source_id, target_id, relation_type, weight, metadata, created_at \
                     FROM relation_edges WHERE source_id = ?1 AND relation_type = ?2",
                    libsql::params![source_id, rt],
                )
                .await
                .map_err(store_err)?,
            None => conn
                .query(
                    "SELECT source_id, target_id, relation_type, weight, metadata, created_at \
                     FROM relation_edges WHERE source_id = ?1",
                    libsql::params![source_id],
                )
                .await
                .map_err(store_err)?,
        };

        let mut edges = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            edges.push(row_to_edge(&row)?);
        }
        Ok(edges)
    }

    /// Inbound edges to `target_id` restricted to the traversal-symmetric
    /// relation types (`semantic`, `entity`) — used when beam search treats
    /// those relations as undirected (§4.7).
    pub async fn edges_to(&self, target_id: i64, relation_type: &str) -> Result<Vec<RelationEdge>> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT source_id, target_id, relation_type, weight, metadata, created_at \
                 FROM relation_edges WHERE target_id = ?1 AND relation_type = ?2",
                libsql::params![target_id, relation_type],
            )
            .await
            .map_err(store_err)?;

        let mut edges = Vec::new();
        while let Some(row) = rows.next().await.map_err(store_err)? {
            edges.push(row_to_edge(&row)?);
        }
        Ok(edges)
    }

    /// Remove all edges touching a document, used when it's deactivated and
    /// later garbage collected.
    pub async fn remove_edges_touching(&self, document_id: i64) -> Result<()> {
        let conn = self.conn().await?;
        conn.execute(
            "DELETE FROM relation_edges WHERE source_id = ?1 OR target_id = ?1",
            libsql::params![document_id],
        )
        .await
        .map_err(store_err)?;
        Ok(())
    }
}

fn row_to_edge(row: &libsql::Row) -> Result<RelationEdge> {
    use chrono::{TimeZone, Utc};
    use clawmem_core::types::RelationType;
    use std::str::FromStr;

    let created_secs: i64 = row.get(5).map_err(store_err)?;
    let relation_type_raw: String = row.get(2).map_err(store_err)?;
    let metadata_raw: String = row.get(4).map_err(store_err)?;
    Ok(RelationEdge {
        source_id: row.get(0).map_err(store_err)?,
        target_id: row.get(1).map_err(store_err)?,
        relation_type: RelationType::from_str(&relation_type_raw).unwrap_or(RelationType::Temporal),
        weight: row.get(3).map_err(store_err)?,
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null),
        created_at: Utc.timestamp_opt(created_secs, 0).single().unwrap_or_else(Utc::now),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::UpsertRequest;
    use clawmem_core::types::ContentType;
    use serde_json::json;

    async fn two_docs() -> (Store, i64, i64) {
        let store = Store::open_in_memory().await.unwrap();
        let (a, _) = store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "a.md",
                title: "A",
                hash: "h1",
                content_hash: "c1",
                content_type: ContentType::Note,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        let (b, _) = store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "b.md",
                title: "B",
                hash: "h2",
                content_hash: "c2",
                content_type: ContentType::Note,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        (store, a, b)
    }

    #[tokio::test]
    async fn insert_edge_is_idempotent() {
        let (store, a, b) = two_docs().await;
        store.insert_edge(a, b, "semantic", 1.0, &json!({})).await.unwrap();
        store.insert_edge(a, b, "semantic", 1.0, &json!({})).await.unwrap();
        let edges = store.edges_from(a, None).await.unwrap();
        assert_eq!(edges.len(), 1);
    }

    #[tokio::test]
    async fn edges_from_filters_by_relation_type() {
        let (store, a, b) = two_docs().await;
        store.insert_edge(a, b, "semantic", 1.0, &json!({})).await.unwrap();
        store.insert_edge(a, b, "temporal", 0.5, &json!({})).await.unwrap();
        let edges = store.edges_from(a, Some("temporal")).await.unwrap();
        assert_eq!(edges.len(), 1);
        assert!((edges[0].weight - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn edges_to_finds_inbound_symmetric_edges() {
        let (store, a, b) = two_docs().await;
        store.insert_edge(a, b, "semantic", 0.8, &json!({})).await.unwrap();
        let edges = store.edges_to(b, "semantic").await.unwrap();
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].source_id, a);
    }
}
