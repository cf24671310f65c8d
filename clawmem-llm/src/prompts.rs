//! Prompt/formatting templates (§4.2). Pure string construction, kept
//! separate from HTTP plumbing so it's independently testable.

use clawmem_core::constants::{EMBED_DOCUMENT_CHAR_LIMIT, RERANK_DOCUMENT_CHAR_LIMIT};

/// Format a query for embedding, per the "query" side of the embedder's
/// asymmetric prompt pair.
#[must_use]
pub fn embed_query_template(query: &str) -> String {
    format!("task: search result | query: {query}")
}

/// Format a document for embedding, truncated to the embedder's safe
/// context window. `title` defaults to the literal `"none"` when absent.
#[must_use]
pub fn embed_document_template(text: &str, title: Option<&str>) -> String {
    let truncated = truncate_chars(text, EMBED_DOCUMENT_CHAR_LIMIT);
    format!("title: {} | text: {truncated}", title.unwrap_or("none"))
}

/// Truncate a reranker candidate document to its safe context window.
#[must_use]
pub fn rerank_document(text: &str) -> String {
    truncate_chars(text, RERANK_DOCUMENT_CHAR_LIMIT)
}

fn truncate_chars(s: &str, limit: usize) -> String {
    if s.chars().count() <= limit {
        return s.to_string();
    }
    s.chars().take(limit).collect()
}

/// The A-MEM construct-note prompt (§4.4): title/path/first-2000-chars of
/// the document, asking for a strict JSON object.
#[must_use]
pub fn construct_note_prompt(title: &str, path: &str, body: &str) -> String {
    let excerpt = truncate_chars(body, 2000);
    format!(
        "Given the document below, respond with ONLY a JSON object of the form \
         {{\"keywords\": [3 to 7 short strings], \"tags\": [2 to 5 short strings], \
         \"context\": \"one or two sentence summary\"}}.\n\n\
         Title: {title}\nPath: {path}\n\nContent:\n{excerpt}"
    )
}

/// A-MEM link-classification prompt (§4.4 `generate_links`): asks the model
/// to classify the relation between a newly indexed document and one
/// candidate neighbor as `semantic`, `supporting`, or `contradicts`.
#[must_use]
pub fn classify_relation_prompt(
    source_title: &str,
    source_excerpt: &str,
    target_title: &str,
    target_excerpt: &str,
) -> String {
    format!(
        "Two documents follow. Respond with ONLY a JSON object of the form \
         {{\"relation\": \"semantic\" | \"supporting\" | \"contradicts\", \
         \"confidence\": 0.0 to 1.0, \"reasoning\": \"one sentence\"}} describing \
         how Document B relates to Document A.\n\n\
         Document A — {source_title}:\n{source_excerpt}\n\n\
         Document B — {target_title}:\n{target_excerpt}"
    )
}

/// A-MEM evolution prompt (§4.4 `evolve_neighbors`): asks the model to
/// refresh a neighbor's note in light of a newly linked document.
#[must_use]
pub fn evolve_note_prompt(
    neighbor_title: &str,
    neighbor_context: &str,
    new_title: &str,
    new_context: &str,
) -> String {
    format!(
        "A document's note may need updating now that a new related document \
         was indexed. Respond with ONLY a JSON object of the form \
         {{\"keywords\": [3 to 7 short strings], \"context\": \"one or two sentence summary\", \
         \"reasoning\": \"one sentence on what changed\"}}.\n\n\
         Existing document — {neighbor_title}:\nCurrent summary: {neighbor_context}\n\n\
         Newly linked document — {new_title}:\nSummary: {new_context}"
    )
}

/// A-MEM causal-inference prompt (§4.4 `causal_inference`): asks whether an
/// earlier observation plausibly caused a later one.
#[must_use]
pub fn causal_prompt(earlier_title: &str, earlier_text: &str, later_title: &str, later_text: &str) -> String {
    format!(
        "Two observations follow, earlier then later. Respond with ONLY a JSON object of the \
         form {{\"confidence\": 0.0 to 1.0, \"reasoning\": \"one sentence\"}} giving the \
         likelihood that the earlier observation caused or directly led to the later one.\n\n\
         Earlier — {earlier_title}:\n{earlier_text}\n\n\
         Later — {later_title}:\n{later_text}"
    )
}

/// Intent-refinement prompt (§4.6): constrains the model to a single
/// capitalized token from the known intent set.
#[must_use]
pub fn intent_classification_prompt(query: &str) -> String {
    format!(
        "Classify the intent behind the search query below as exactly one of: \
         WHY, WHEN, ENTITY, WHAT. Respond with that single word and nothing else.\n\n\
         Query: {query}"
    )
}

/// The query-expansion prompt (§4.2 `expand_query`): asks for line-prefixed
/// `lex:`/`vec:`/`hyde:` variants.
#[must_use]
pub fn expand_query_prompt(query: &str, include_lexical: bool, context: Option<&str>) -> String {
    let lexical_line = if include_lexical {
        "Also produce 2 to 3 lines prefixed `lex:` with short keyword variants.\n"
    } else {
        ""
    };
    let context_line = context
        .map(|c| format!("Context: {c}\n"))
        .unwrap_or_default();
    format!(
        "{context_line}Given the search query below, produce 1 to 3 lines prefixed `vec:` with \
         semantically equivalent rewrites, and at most one line prefixed `hyde:` with a short \
         hypothetical passage that would answer the query.\n{lexical_line}\nQuery: {query}"
    )
}
