#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! # ClawMem Engine
//!
//! Retrieval, A-MEM enrichment, and graph intelligence (§4.3-§4.11): the
//! collection indexer, fragment splitter, self-evolving semantic notes,
//! intent classification, weighted graph traversal, composite scoring, and
//! the consolidation and feedback workers. Everything here is built on top
//! of [`clawmem_store::Store`] and [`clawmem_llm::Gateway`]; this crate owns
//! no storage or networking of its own.

mod amem;
mod consolidation;
mod feedback;
mod frontmatter;
mod glob;
mod graph_builder;
mod indexer;
mod intent;
mod retrieval;
mod scoring;
mod snippet;
mod splitter;
mod traversal;

pub use amem::{causal_inference, construct_note, enrich, evolve_neighbors, generate_links, EnrichmentReport};
pub use consolidation::{clamp_interval, ConsolidationReport, ConsolidationWorker};
pub use feedback::{process_session_feedback, FeedbackReport};
pub use frontmatter::{first_heading, parse_frontmatter, Frontmatter};
pub use graph_builder::{build_semantic_graph, build_temporal_backbone};
pub use indexer::{index_collection, IndexReport};
pub use intent::{classify, classify_heuristic, HeuristicResult};
pub use retrieval::{hybrid_search, intent_aware_search, keyword_search, vector_search, RetrievalResult};
pub use scoring::{
    composite_score, composite_weights_for, confidence_score, content_type_confidence_baseline,
    content_type_half_life_days, floats_under_recency_intent, matches_recency_intent,
    reciprocal_rank_fusion, reciprocal_rank_fusion_with_k, recency_score,
};
pub use snippet::extract_snippet;
pub use splitter::{split_document, Fragment, SplitContext};
pub use traversal::{merge_traversal, traverse, Anchor, VisitedNode};
