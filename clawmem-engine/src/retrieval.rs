//! The retrieval orchestrator (§4.9, component C9): four pipelines over the
//! same boundary contract, built from `clawmem-store`'s FTS/vector legs,
//! `clawmem-llm`'s query expansion and reranker, and this crate's scoring,
//! traversal, and snippet helpers.

use std::collections::HashMap;

use chrono::Utc;
use clawmem_core::types::{ContentType, Intent};
use clawmem_core::virtual_path::{build_virtual_path, short_docid};
use clawmem_core::Result;
use clawmem_llm::{EmbedOptions, Gateway};
use clawmem_store::{Document, Store};

use crate::scoring::{composite_score, composite_weights_for, confidence_score, recency_score};
use crate::snippet::extract_snippet;
use crate::traversal::{merge_traversal, traverse, Anchor};

/// Candidate pool size fed into fusion/rerank in the hybrid and
/// intent-aware pipelines (§4.9 step 3c: "take top 30").
const FUSE_TOP_N: usize = 30;
/// Over-fetch size for each individual FTS/vector leg before fusion.
const LEG_CANDIDATES: usize = 40;
/// Body slice length the cross-encoder reranker is fed (§4.9 step 3d).
const RERANK_BODY_CHAR_LIMIT: usize = 4_000;
const SNIPPET_MAX_CHARS: usize = 400;
/// Anchors handed to graph traversal (§4.7: "typically top-10 of the fused list").
const TRAVERSAL_ANCHOR_COUNT: usize = 10;

/// One retrieval hit, the shape every pipeline returns (§4.9 boundary contract).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RetrievalResult {
    pub docid: String,
    pub file: String,
    pub title: String,
    pub snippet: String,
    pub composite_score: f64,
    pub recency_score: f64,
    pub search_score: f64,
    pub content_type: ContentType,
    pub context: Option<String>,
}

async fn enrich(store: &Store, doc: Document, search_score: f64, query: &str) -> Result<RetrievalResult> {
    let body = store.get_content(&doc.hash).await?.unwrap_or_default();
    let recency = recency_score(doc.modified_at, Utc::now(), doc.content_type);
    let confidence = confidence_score(doc.content_type, recency, doc.access_count);
    let weights = composite_weights_for(query);
    let composite = composite_score(search_score, recency, confidence, weights);
    let snippet = extract_snippet(&body, query, SNIPPET_MAX_CHARS, None);

    Ok(RetrievalResult {
        docid: short_docid(&doc.hash),
        file: build_virtual_path(&doc.collection, &doc.path),
        title: doc.title,
        snippet,
        composite_score: composite,
        recency_score: recency,
        search_score,
        content_type: doc.content_type,
        context: doc.amem_context,
    })
}

fn sort_and_truncate(mut results: Vec<RetrievalResult>, limit: usize) -> Vec<RetrievalResult> {
    results.sort_by(|a, b| b.composite_score.partial_cmp(&a.composite_score).unwrap_or(std::cmp::Ordering::Equal));
    results.truncate(limit);
    results
}

/// Pipeline 1 (§4.9): `search_fts → enrich → composite`.
pub async fn keyword_search(store: &Store, query: &str, limit: usize, collection: Option<&str>) -> Result<Vec<RetrievalResult>> {
    let hits = store.search_fts(query, limit.max(LEG_CANDIDATES), collection).await?;
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        results.push(enrich(store, hit.document, hit.score, query).await?);
    }
    Ok(sort_and_truncate(results, limit))
}

/// Pipeline 2 (§4.9): `embed(query) → knn → enrich → composite`.
pub async fn vector_search(
    store: &Store,
    gateway: &Gateway,
    query: &str,
    limit: usize,
    collection: Option<&str>,
) -> Result<Vec<RetrievalResult>> {
    let embedded = gateway.embed(query, &EmbedOptions { is_query: true, title: None }).await?;
    let hits = store.search_vec(&embedded.vector, limit.max(LEG_CANDIDATES), collection).await?;
    let mut results = Vec::with_capacity(hits.len());
    for hit in hits {
        results.push(enrich(store, hit.document, hit.score, query).await?);
    }
    Ok(sort_and_truncate(results, limit))
}

/// Run the FTS and vector legs for one query string, returning each as a
/// rank-ordered list of document-id strings.
async fn run_legs(store: &Store, gateway: &Gateway, text: &str, collection: Option<&str>) -> Result<(Vec<String>, Vec<String>)> {
    let fts_ids = store
        .search_fts(text, LEG_CANDIDATES, collection)
        .await?
        .into_iter()
        .map(|hit| hit.document.id.to_string())
        .collect();

    let embedded = gateway.embed(text, &EmbedOptions { is_query: true, title: None }).await?;
    let vec_ids = store
        .search_vec(&embedded.vector, LEG_CANDIDATES, collection)
        .await?
        .into_iter()
        .map(|hit| hit.document.id.to_string())
        .collect();

    Ok((fts_ids, vec_ids))
}

/// Fetch and body-slice the documents behind a fused candidate list, for
/// handoff to the reranker.
async fn load_rerank_candidates(store: &Store, ids: &[String]) -> Result<Vec<(String, Document, String)>> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        let Ok(doc_id) = id.parse::<i64>() else { continue };
        let Some(doc) = store.get_document(doc_id).await? else { continue };
        let body = store.get_content(&doc.hash).await?.unwrap_or_default();
        let sliced: String = body.chars().take(RERANK_BODY_CHAR_LIMIT).collect();
        out.push((id.clone(), doc, sliced));
    }
    Ok(out)
}

/// Blend an RRF-fused ranking with reranker scores using the position-aware
/// ratio from §4.9 step 3e: top-3 weight the reranker lightly, rank 4-10
/// are balanced, and beyond rank 10 the reranker dominates.
fn blend_rrf_and_rerank(fused: &[(String, f64)], rerank_scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    let mut blended = HashMap::with_capacity(fused.len());
    for (rank, (id, _)) in fused.iter().enumerate() {
        let rrf_component = 1.0 / (rank as f64 + 1.0);
        let rerank_component = rerank_scores.get(id).copied().unwrap_or(0.0);
        let (w_rrf, w_rerank) = if rank < 3 {
            (0.75, 0.25)
        } else if rank < 10 {
            (0.60, 0.40)
        } else {
            (0.40, 0.60)
        };
        blended.insert(id.clone(), w_rrf * rrf_component + w_rerank * rerank_component);
    }
    blended
}

/// Pipeline 3 (§4.9), the highest-quality path: query expansion, per-variant
/// FTS/vector fusion, RRF, cross-encoder rerank, a position-aware blend,
/// then the usual enrich/composite step.
pub async fn hybrid_search(
    store: &Store,
    gateway: &Gateway,
    query: &str,
    limit: usize,
    collection: Option<&str>,
) -> Result<Vec<RetrievalResult>> {
    let variants = gateway.expand_query(query, true, None).await?;

    let mut lists: Vec<Vec<String>> = Vec::new();
    let mut weights: Vec<f64> = Vec::new();

    let (original_fts, original_vec) = run_legs(store, gateway, query, collection).await?;
    lists.push(original_fts);
    weights.push(2.0);
    lists.push(original_vec);
    weights.push(2.0);

    for variant in &variants {
        let (fts_ids, vec_ids) = run_legs(store, gateway, &variant.text, collection).await?;
        lists.push(fts_ids);
        weights.push(1.0);
        lists.push(vec_ids);
        weights.push(1.0);
    }

    let mut fused = crate::scoring::reciprocal_rank_fusion(&weights, &lists)?;
    fused.truncate(FUSE_TOP_N);

    let candidates = load_rerank_candidates(store, &fused.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>()).await?;
    let rerank_docs: Vec<(String, String)> = candidates.iter().map(|(id, _, body)| (id.clone(), body.clone())).collect();
    let rerank_hits = gateway.rerank(query, &rerank_docs).await?;
    let rerank_scores: HashMap<String, f64> = rerank_hits.into_iter().map(|hit| (hit.file, hit.score)).collect();

    let blended = blend_rrf_and_rerank(&fused, &rerank_scores);

    let mut results = Vec::with_capacity(candidates.len());
    for (id, doc, _) in candidates {
        let search_score = blended.get(&id).copied().unwrap_or(0.0);
        results.push(enrich(store, doc, search_score, query).await?);
    }
    Ok(sort_and_truncate(results, limit))
}

/// Intent-biased leg weights (§4.9 step 4b): `WHEN` favors the lexical leg,
/// `WHY` favors the vector leg, everything else is balanced.
fn intent_leg_weights(intent: Intent) -> (f64, f64) {
    match intent {
        Intent::When => (2.0, 1.0),
        Intent::Why => (1.0, 2.0),
        Intent::Entity | Intent::What => (1.0, 1.0),
    }
}

/// Pipeline 4 (§4.9): classify intent, fuse FTS/vector with intent-biased
/// weights, optionally merge in a graph traversal for `WHY`/`ENTITY`
/// queries, then rerank and composite-score.
pub async fn intent_aware_search(
    store: &Store,
    gateway: &Gateway,
    query: &str,
    limit: usize,
    enable_traversal: bool,
    collection: Option<&str>,
) -> Result<Vec<RetrievalResult>> {
    let classification = crate::intent::classify(store, gateway, query).await?;
    let (fts_weight, vec_weight) = intent_leg_weights(classification.intent);

    let (fts_ids, vec_ids) = run_legs(store, gateway, query, collection).await?;
    let mut fused = crate::scoring::reciprocal_rank_fusion(&[fts_weight, vec_weight], &[fts_ids, vec_ids])?;
    fused.truncate(FUSE_TOP_N);

    if enable_traversal && matches!(classification.intent, Intent::Why | Intent::Entity) {
        let anchors: Vec<Anchor> = fused
            .iter()
            .take(TRAVERSAL_ANCHOR_COUNT)
            .filter_map(|(id, score)| id.parse::<i64>().ok().map(|document_id| Anchor { document_id, score: *score }))
            .collect();

        if !anchors.is_empty() {
            let embedded = gateway.embed(query, &EmbedOptions { is_query: true, title: None }).await?;
            let traversal_results = traverse(store, &anchors, &embedded.vector, classification.intent).await?;

            let original: Vec<(i64, f64)> = fused
                .iter()
                .filter_map(|(id, score)| id.parse::<i64>().ok().map(|document_id| (document_id, *score)))
                .collect();
            let merged = merge_traversal(&original, &traversal_results);
            fused = merged.into_iter().map(|(id, score)| (id.to_string(), score)).collect();
            fused.truncate(FUSE_TOP_N);
        }
    }

    let candidates = load_rerank_candidates(store, &fused.iter().map(|(id, _)| id.clone()).collect::<Vec<_>>()).await?;
    let rerank_docs: Vec<(String, String)> = candidates.iter().map(|(id, _, body)| (id.clone(), body.clone())).collect();
    let rerank_hits = gateway.rerank(query, &rerank_docs).await?;
    let rerank_scores: HashMap<String, f64> = rerank_hits.into_iter().map(|hit| (hit.file, hit.score)).collect();

    let blended = blend_rrf_and_rerank(&fused, &rerank_scores);

    let mut results = Vec::with_capacity(candidates.len());
    for (id, doc, _) in candidates {
        let search_score = blended.get(&id).copied().unwrap_or(0.0);
        results.push(enrich(store, doc, search_score, query).await?);
    }
    Ok(sort_and_truncate(results, limit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_llm::GatewayConfig;
    use clawmem_store::UpsertRequest;

    fn local_gateway() -> Gateway {
        Gateway::new(GatewayConfig { idle_unload_secs: 0, ..GatewayConfig::default() })
    }

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("the quick brown fox jumps over the lazy dog").await.unwrap();
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
    async fn keyword_search_returns_the_boundary_contract_shape() {
        let store = seeded_store().await;
        let results = keyword_search(&store, "fox", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Quick Fox");
        assert!(results[0].file.starts_with("clawmem://notes/"));
        assert!(!results[0].docid.is_empty());
    }

    #[tokio::test]
    async fn keyword_search_honors_the_collection_filter() {
        let store = seeded_store().await;
        let results = keyword_search(&store, "fox", 5, Some("other")).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn vector_search_falls_back_to_local_embedder() {
        let store = seeded_store().await;
        let gateway = local_gateway();
        let results = vector_search(&store, &gateway, "fox", 5, None).await.unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn blend_favors_rerank_score_past_rank_ten() {
        let fused = vec![("a".to_string(), 1.0)];
        let mut scores = HashMap::new();
        scores.insert("a".to_string(), 0.9);
        let fused_at_rank_11: Vec<(String, f64)> =
            (0..11).map(|i| (i.to_string(), 1.0 - i as f64 * 0.01)).chain(fused).collect();
        let blended = blend_rrf_and_rerank(&fused_at_rank_11, &scores);
        let score = *blended.get("a").unwrap();
        assert!(score > 0.4 * (1.0 / 12.0));
    }

    #[test]
    fn intent_weights_bias_when_toward_lexical() {
        assert_eq!(intent_leg_weights(Intent::When), (2.0, 1.0));
        assert_eq!(intent_leg_weights(Intent::Why), (1.0, 2.0));
        assert_eq!(intent_leg_weights(Intent::What), (1.0, 1.0));
    }
}
