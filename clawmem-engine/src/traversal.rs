//! Intent-weighted beam search over the relation graph (§4.7, component C7).

use std::collections::{HashMap, HashSet};

use clawmem_core::constants::{
    TRAVERSAL_BEAM_WIDTH, TRAVERSAL_BUDGET, TRAVERSAL_DECAY_GAMMA, TRAVERSAL_LAMBDA_RELATION,
    TRAVERSAL_LAMBDA_SIMILARITY, TRAVERSAL_MAX_DEPTH,
};
use clawmem_core::types::{Intent, RelationType};
use clawmem_core::Result;
use clawmem_store::Store;

/// One anchor document feeding the beam search, with its fused score from
/// the upstream ranked list.
#[derive(Debug, Clone)]
pub struct Anchor {
    pub document_id: i64,
    pub score: f64,
}

/// A document reached by traversal, with the score it accumulated.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedNode {
    pub document_id: i64,
    pub score: f64,
}

/// Beam search outward from `anchors` along the relation graph, scoring
/// each hop by the intent's relation weight and the cosine similarity
/// between `query_embedding` and the neighbor's own embedding (§4.7).
///
/// `semantic` and `entity` edges are traversed in both directions;
/// everything else only outbound, matching [`RelationType::is_traversal_symmetric`].
pub async fn traverse(store: &Store, anchors: &[Anchor], query_embedding: &[f32], intent: Intent) -> Result<Vec<VisitedNode>> {
    let weights = intent.relation_weights();
    let mut visited: HashMap<i64, f64> = HashMap::new();
    let mut frontier: Vec<(i64, f64)> = Vec::new();

    for anchor in anchors {
        visited.insert(anchor.document_id, anchor.score);
        frontier.push((anchor.document_id, anchor.score));
    }

    for _depth in 0..TRAVERSAL_MAX_DEPTH {
        if frontier.is_empty() || visited.len() >= TRAVERSAL_BUDGET {
            break;
        }

        let mut candidates: Vec<(i64, f64)> = Vec::new();
        for &(node_id, node_score) in &frontier {
            let edges = neighbor_edges(store, node_id).await?;
            for (neighbor_id, relation, edge_weight) in edges {
                if visited.contains_key(&neighbor_id) {
                    continue;
                }
                let similarity = cosine_to_neighbor(store, neighbor_id, query_embedding).await?;
                let transition = (TRAVERSAL_LAMBDA_RELATION * weights.for_relation(relation)
                    + TRAVERSAL_LAMBDA_SIMILARITY * similarity)
                    .exp();
                let score = node_score * TRAVERSAL_DECAY_GAMMA + transition * edge_weight;
                candidates.push((neighbor_id, score));
            }
        }

        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(TRAVERSAL_BEAM_WIDTH);

        frontier.clear();
        for (neighbor_id, score) in candidates {
            if visited.len() >= TRAVERSAL_BUDGET {
                break;
            }
            visited.entry(neighbor_id).or_insert(score);
            frontier.push((neighbor_id, score));
        }
    }

    let mut nodes: Vec<VisitedNode> = visited
        .into_iter()
        .map(|(document_id, score)| VisitedNode { document_id, score })
        .collect();
    nodes.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    Ok(nodes)
}

/// All edges reachable from `node_id`: every outbound edge, plus inbound
/// edges restricted to the traversal-symmetric relation types.
async fn neighbor_edges(store: &Store, node_id: i64) -> Result<Vec<(i64, RelationType, f64)>> {
    let mut out = Vec::new();
    for edge in store.edges_from(node_id, None).await? {
        out.push((edge.target_id, edge.relation_type, edge.weight));
    }
    for relation in [RelationType::Semantic, RelationType::Entity] {
        debug_assert!(relation.is_traversal_symmetric());
        for edge in store.edges_to(node_id, relation.as_str()).await? {
            out.push((edge.source_id, edge.relation_type, edge.weight));
        }
    }
    Ok(out)
}

async fn cosine_to_neighbor(store: &Store, document_id: i64, query_embedding: &[f32]) -> Result<f64> {
    if query_embedding.is_empty() {
        return Ok(0.0);
    }
    let Some(document) = store.get_document(document_id).await? else {
        return Ok(0.0);
    };
    let Some(vector) = store.get_embedding_vector(&document.hash, 0).await? else {
        return Ok(0.0);
    };
    Ok(cosine_similarity(query_embedding, &vector))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    let similarity = dot / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity
    } else {
        0.0
    }
}

/// Fold traversal results back into an originally-ranked list (§4.7's merge
/// policy): documents found by both methods are boosted to
/// `max(original, 1.1 · graph)`; traversal-only documents are penalized to
/// `0.8 · graph` and appended.
#[must_use]
pub fn merge_traversal(original: &[(i64, f64)], traversal_results: &[VisitedNode]) -> Vec<(i64, f64)> {
    let mut merged: HashMap<i64, f64> = original.iter().copied().collect();
    let original_ids: HashSet<i64> = original.iter().map(|(id, _)| *id).collect();

    for node in traversal_results {
        if original_ids.contains(&node.document_id) {
            let existing = merged.get(&node.document_id).copied().unwrap_or(0.0);
            merged.insert(node.document_id, existing.max(1.1 * node.score));
        } else {
            merged.insert(node.document_id, 0.8 * node.score);
        }
    }

    let mut result: Vec<(i64, f64)> = merged.into_iter().collect();
    result.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    result
}
