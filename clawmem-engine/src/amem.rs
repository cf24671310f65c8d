//! Self-evolving semantic notes (§4.4, component C4): construct a note for
//! every indexed document, link new documents to their nearest neighbors,
//! cascade-refresh those neighbors' notes, and infer causal order between
//! observations. Every step is non-fatal — a failure is logged and the
//! remaining steps still run, mirroring the teacher's stance that enrichment
//! quality never blocks ingestion.

use clawmem_core::constants::{AMEM_DEFAULT_K, AMEM_EVOLVE_NEIGHBOR_LIMIT, CAUSAL_MIN_CONFIDENCE};
use clawmem_core::types::{Document, RelationType};
use clawmem_core::Result;
use clawmem_llm::{causal_prompt, classify_relation_prompt, construct_note_prompt, evolve_note_prompt};
use clawmem_llm::{Gateway, GenerateOptions};
use clawmem_store::Store;
use serde_json::{json, Value};
use tracing::warn;

const EXCERPT_CHARS: usize = 600;

/// Tally of what one enrichment pass over a document did.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct EnrichmentReport {
    pub note_written: bool,
    pub links_created: usize,
    pub neighbors_evolved: usize,
    pub causal_edges: usize,
}

/// Run the full enrichment pipeline for one document. `is_new` gates the
/// link/evolution/causal steps, which only make sense the first time a
/// document is seen (§4.4: "re-running for an unchanged document only
/// refreshes its own note").
pub async fn enrich(store: &Store, gateway: &Gateway, document_id: i64, is_new: bool) -> Result<EnrichmentReport> {
    let mut report = EnrichmentReport::default();

    match construct_note(store, gateway, document_id).await {
        Ok(written) => report.note_written = written,
        Err(err) => warn!(?err, document_id, "construct_note failed"),
    }

    if !is_new {
        return Ok(report);
    }

    match generate_links(store, gateway, document_id).await {
        Ok(n) => report.links_created = n,
        Err(err) => warn!(?err, document_id, "generate_links failed"),
    }

    match evolve_neighbors(store, gateway, document_id).await {
        Ok(n) => report.neighbors_evolved = n,
        Err(err) => warn!(?err, document_id, "evolve_neighbors failed"),
    }

    match causal_inference(store, gateway, document_id).await {
        Ok(n) => report.causal_edges = n,
        Err(err) => warn!(?err, document_id, "causal_inference failed"),
    }

    Ok(report)
}

/// Construct (or refresh) a document's A-MEM note: keywords, tags, a short
/// context summary. Always persists, even an empty note on failure (§4.4).
pub async fn construct_note(store: &Store, gateway: &Gateway, document_id: i64) -> Result<bool> {
    let Some(doc) = store.get_document(document_id).await? else {
        return Ok(false);
    };
    let body = store.get_content(&doc.hash).await?.unwrap_or_default();
    let prompt = construct_note_prompt(&doc.title, &doc.path, &body);

    let parsed = match gateway.generate(&prompt, &note_opts()).await {
        Ok(result) => clawmem_llm::repair_json(&result.text),
        Err(err) => {
            warn!(?err, document_id, "construct_note generation failed");
            None
        }
    };

    let keywords = parsed.as_ref().and_then(|v| string_array(v, "keywords")).unwrap_or_default();
    let tags = parsed.as_ref().and_then(|v| string_array(v, "tags")).unwrap_or_default();
    let context = parsed
        .as_ref()
        .and_then(|v| v.get("context"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let wrote_something = !keywords.is_empty() || !context.is_empty();
    store.set_note(document_id, &keywords, &tags, &context).await?;
    Ok(wrote_something)
}

/// Link a newly indexed document to its nearest semantic neighbors (§4.4).
/// Uses the document's own `seq = 0` embedding as the seed vector for
/// [`clawmem_store::Store::search_vec`], over-fetching to account for the
/// document matching itself, then asks the model to classify each edge.
pub async fn generate_links(store: &Store, gateway: &Gateway, document_id: i64) -> Result<usize> {
    let Some(doc) = store.get_document(document_id).await? else {
        return Ok(0);
    };
    let Some(seed) = store.get_embedding_vector(&doc.hash, 0).await? else {
        return Ok(0);
    };
    let body = store.get_content(&doc.hash).await?.unwrap_or_default();
    let source_excerpt = excerpt(&body);

    let over_fetch = AMEM_DEFAULT_K + 4;
    let neighbors: Vec<Document> = store
        .search_vec(&seed, over_fetch, None)
        .await?
        .into_iter()
        .map(|hit| hit.document)
        .filter(|d| d.id != document_id)
        .take(AMEM_DEFAULT_K)
        .collect();

    let mut created = 0;
    for neighbor in neighbors {
        let neighbor_body = store.get_content(&neighbor.hash).await?.unwrap_or_default();
        let prompt = classify_relation_prompt(&doc.title, &source_excerpt, &neighbor.title, &excerpt(&neighbor_body));

        let result = match gateway.generate(&prompt, &note_opts()).await {
            Ok(r) => r,
            Err(err) => {
                warn!(?err, neighbor_id = neighbor.id, "link classification generation failed");
                continue;
            }
        };
        let Some(value) = clawmem_llm::repair_json(&result.text) else {
            continue;
        };
        let Some(relation) = value.get("relation").and_then(Value::as_str).and_then(parse_link_relation) else {
            continue;
        };
        let confidence = value.get("confidence").and_then(Value::as_f64).unwrap_or(0.5).clamp(0.0, 1.0);
        let reasoning = value.get("reasoning").and_then(Value::as_str).unwrap_or_default();

        store
            .insert_edge(document_id, neighbor.id, relation.as_str(), confidence, &json!({"reasoning": reasoning}))
            .await?;
        created += 1;
    }
    Ok(created)
}

/// Cascade-refresh the notes of a new document's direct neighbors (§4.4).
/// Bounded to [`AMEM_EVOLVE_NEIGHBOR_LIMIT`] neighbors per call.
pub async fn evolve_neighbors(store: &Store, gateway: &Gateway, document_id: i64) -> Result<usize> {
    let Some(new_doc) = store.get_document(document_id).await? else {
        return Ok(0);
    };

    let mut neighbor_ids: Vec<i64> = store.edges_from(document_id, None).await?.into_iter().map(|e| e.target_id).collect();
    for symmetric in [RelationType::Semantic, RelationType::Entity] {
        let inbound = store.edges_to(document_id, symmetric.as_str()).await?;
        neighbor_ids.extend(inbound.into_iter().map(|e| e.source_id));
    }
    neighbor_ids.sort_unstable();
    neighbor_ids.dedup();
    neighbor_ids.truncate(AMEM_EVOLVE_NEIGHBOR_LIMIT);

    let mut evolved = 0;
    for neighbor_id in neighbor_ids {
        let Some(neighbor) = store.get_document(neighbor_id).await? else {
            continue;
        };
        let prompt = evolve_note_prompt(
            &neighbor.title,
            neighbor.amem_context.as_deref().unwrap_or(""),
            &new_doc.title,
            new_doc.amem_context.as_deref().unwrap_or(""),
        );

        let result = match gateway.generate(&prompt, &note_opts()).await {
            Ok(r) => r,
            Err(err) => {
                warn!(?err, neighbor_id, "evolution generation failed");
                continue;
            }
        };
        let Some(value) = clawmem_llm::repair_json(&result.text) else {
            continue;
        };
        let keywords = string_array(&value, "keywords").unwrap_or_else(|| neighbor.amem_keywords.clone().unwrap_or_default());
        let context = value
            .get("context")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| neighbor.amem_context.clone().unwrap_or_default());
        let reasoning = value
            .get("reasoning")
            .and_then(Value::as_str)
            .unwrap_or("linked to a newly indexed document");

        if let Err(err) = store.apply_evolution(neighbor_id, document_id, &keywords, &context, reasoning).await {
            warn!(?err, neighbor_id, "failed to apply evolution");
            continue;
        }
        evolved += 1;
    }
    Ok(evolved)
}

/// Infer causal edges between a new observation and recent prior ones
/// (§4.4). A no-op for any document that isn't an observation.
pub async fn causal_inference(store: &Store, gateway: &Gateway, document_id: i64) -> Result<usize> {
    let Some(doc) = store.get_document(document_id).await? else {
        return Ok(0);
    };
    if !doc.is_observation() {
        return Ok(0);
    }

    let mut candidates: Vec<Document> = store
        .active_documents()
        .await?
        .into_iter()
        .filter(|d| d.is_observation() && d.id != document_id && d.created_at < doc.created_at)
        .collect();
    candidates.sort_by_key(|d| std::cmp::Reverse(d.created_at));
    candidates.truncate(5);

    let mut inferred = 0;
    for candidate in candidates {
        let prompt = causal_prompt(
            &candidate.title,
            candidate.observation_narrative.as_deref().unwrap_or(""),
            &doc.title,
            doc.observation_narrative.as_deref().unwrap_or(""),
        );

        let result = match gateway.generate(&prompt, &note_opts()).await {
            Ok(r) => r,
            Err(err) => {
                warn!(?err, candidate_id = candidate.id, "causal inference generation failed");
                continue;
            }
        };
        let Some(value) = clawmem_llm::repair_json(&result.text) else {
            continue;
        };
        let confidence = value.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
        if confidence < CAUSAL_MIN_CONFIDENCE {
            continue;
        }
        let reasoning = value.get("reasoning").and_then(Value::as_str).unwrap_or_default();
        store
            .insert_edge(candidate.id, document_id, RelationType::Causal.as_str(), confidence, &json!({"reasoning": reasoning}))
            .await?;
        inferred += 1;
    }
    Ok(inferred)
}

fn note_opts() -> GenerateOptions {
    GenerateOptions { max_tokens: 300, temperature: 0.2, ..GenerateOptions::default() }
}

fn parse_link_relation(raw: &str) -> Option<RelationType> {
    match raw {
        "semantic" => Some(RelationType::Semantic),
        "supporting" => Some(RelationType::Supporting),
        "contradicts" => Some(RelationType::Contradicts),
        _ => None,
    }
}

fn string_array(value: &Value, key: &str) -> Option<Vec<String>> {
    value.get(key)?.as_array().map(|arr| arr.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= EXCERPT_CHARS {
        body.to_string()
    } else {
        body.chars().take(EXCERPT_CHARS).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_core::types::ContentType;
    use clawmem_llm::GatewayConfig;
    use clawmem_store::UpsertRequest;

    fn local_gateway() -> Gateway {
        Gateway::new(GatewayConfig {
            embed_model: "local".to_string(),
            llm_model: "local".to_string(),
            rerank_model: "local".to_string(),
            ..GatewayConfig::default()
        })
    }

    async fn seeded_doc(store: &Store, path: &str) -> i64 {
        let (id, _) = store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path,
                title: "A title",
                hash: &store.insert_content("some body text here").await.unwrap(),
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
    async fn construct_note_persists_even_on_unparseable_output() {
        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let id = seeded_doc(&store, "a.md").await;

        construct_note(&store, &gateway, id).await.unwrap();
        let doc = store.get_document(id).await.unwrap().unwrap();
        assert!(doc.is_enriched());
    }

    #[tokio::test]
    async fn generate_links_is_a_noop_without_embeddings() {
        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let id = seeded_doc(&store, "a.md").await;

        let created = generate_links(&store, &gateway, id).await.unwrap();
        assert_eq!(created, 0);
    }

    #[tokio::test]
    async fn causal_inference_skips_non_observations() {
        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let id = seeded_doc(&store, "a.md").await;

        let edges = causal_inference(&store, &gateway, id).await.unwrap();
        assert_eq!(edges, 0);
    }

    #[tokio::test]
    async fn enrich_skips_link_steps_for_unchanged_documents() {
        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let id = seeded_doc(&store, "a.md").await;

        let report = enrich(&store, &gateway, id, false).await.unwrap();
        assert_eq!(report.links_created, 0);
        assert_eq!(report.neighbors_evolved, 0);
        assert_eq!(report.causal_edges, 0);
    }
}
