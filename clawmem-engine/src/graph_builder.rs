//! Graph construction (§4.5, component C5): the temporal backbone linking
//! consecutive documents, and the semantic graph linking documents above a
//! similarity threshold. Both are idempotent — re-running never duplicates
//! or re-weights an edge, since [`clawmem_store::Store::insert_edge`] is an
//! `INSERT OR IGNORE` on `(source, target, relation_type)`.

use clawmem_core::constants::{SEMANTIC_GRAPH_MAX_NEIGHBORS, SEMANTIC_GRAPH_THRESHOLD};
use clawmem_core::types::RelationType;
use clawmem_core::Result;
use clawmem_store::Store;
use serde_json::json;

/// Link every pair of consecutively created active documents with a
/// `temporal` edge of weight 1.0 (§4.5). Returns the number of edges
/// attempted (including ones `INSERT OR IGNORE` silently skipped).
pub async fn build_temporal_backbone(store: &Store) -> Result<usize> {
    let docs = store.active_documents().await?;
    let mut attempted = 0;
    for pair in docs.windows(2) {
        store.insert_edge(pair[0].id, pair[1].id, RelationType::Temporal.as_str(), 1.0, &json!({})).await?;
        attempted += 1;
    }
    Ok(attempted)
}

/// Link each active document to up to [`SEMANTIC_GRAPH_MAX_NEIGHBORS`] of
/// its nearest neighbors whose cosine similarity clears
/// [`SEMANTIC_GRAPH_THRESHOLD`] (§4.5). Uses the document's own `seq = 0`
/// embedding as the seed vector, the same pattern as A-MEM's
/// [`crate::generate_links`].
pub async fn build_semantic_graph(store: &Store) -> Result<usize> {
    let docs = store.active_documents().await?;
    let mut created = 0;

    for doc in &docs {
        let Some(seed) = store.get_embedding_vector(&doc.hash, 0).await? else {
            continue;
        };
        let over_fetch = SEMANTIC_GRAPH_MAX_NEIGHBORS + 4;
        let neighbors = store.search_vec(&seed, over_fetch, None).await?;

        let mut linked = 0;
        for hit in neighbors {
            if linked >= SEMANTIC_GRAPH_MAX_NEIGHBORS {
                break;
            }
            if hit.document.id == doc.id || hit.score < f64::from(SEMANTIC_GRAPH_THRESHOLD) {
                continue;
            }
            store
                .insert_edge(doc.id, hit.document.id, RelationType::Semantic.as_str(), hit.score, &json!({}))
                .await?;
            linked += 1;
            created += 1;
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_core::types::ContentType;
    use clawmem_store::UpsertRequest;

    async fn doc(store: &Store, path: &str) -> i64 {
        let (id, _) = store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path,
                title: path,
                hash: &store.insert_content(path).await.unwrap(),
                content_hash: path,
                content_type: ContentType::Note,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn temporal_backbone_links_consecutive_documents() {
        let store = Store::open_in_memory().await.unwrap();
        let a = doc(&store, "a.md").await;
        let b = doc(&store, "b.md").await;
        let c = doc(&store, "c.md").await;

        let edges = build_temporal_backbone(&store).await.unwrap();
        assert_eq!(edges, 2);
        assert_eq!(store.edges_from(a, Some("temporal")).await.unwrap()[0].target_id, b);
        assert_eq!(store.edges_from(b, Some("temporal")).await.unwrap()[0].target_id, c);
    }

    #[tokio::test]
    async fn temporal_backbone_is_idempotent() {
        let store = Store::open_in_memory().await.unwrap();
        let a = doc(&store, "a.md").await;
        doc(&store, "b.md").await;

        build_temporal_backbone(&store).await.unwrap();
        build_temporal_backbone(&store).await.unwrap();

        assert_eq!(store.edges_from(a, Some("temporal")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn semantic_graph_is_a_noop_without_embeddings() {
        let store = Store::open_in_memory().await.unwrap();
        doc(&store, "a.md").await;
        doc(&store, "b.md").await;

        let edges = build_semantic_graph(&store).await.unwrap();
        assert_eq!(edges, 0);
    }
}
