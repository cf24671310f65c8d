//! Magic numbers named throughout the spec, centralized so they are defined
//! once instead of scattered as repeated literals (mirrors the teacher's
//! `memory_core::constants`).

/// Default collection glob when a collection config omits `pattern` (§6).
pub const DEFAULT_COLLECTION_PATTERN: &str = "**/*.md";

/// Directories excluded from the collection walk regardless of glob (§4.3).
pub const EXCLUDED_DIRECTORIES: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "dist",
    "build",
    ".next",
    ".cache",
    ".idea",
    ".vscode",
    "vendor",
    "__pycache__",
];

/// Hard ceiling on fuzzy-path Levenshtein lookups (§4.1).
pub const MAX_PATH_LENGTH: usize = 4096;

/// Hard character ceiling on splitter input, to bound pathological files (§4.3).
pub const SPLITTER_INPUT_CHAR_CEILING: usize = 2_000_000;

/// Minimum document size (chars) before the splitter looks for sub-fragments (§4.3).
pub const SPLITTER_MIN_SIZE_FOR_FRAGMENTS: usize = 500;

/// Maximum number of fragments produced per document (§4.3).
pub const SPLITTER_MAX_FRAGMENTS: usize = 64;

/// Document-side embedding truncation length in characters (§4.2).
pub const EMBED_DOCUMENT_CHAR_LIMIT: usize = 1100;

/// Reranker document truncation length in characters (§4.2).
pub const RERANK_DOCUMENT_CHAR_LIMIT: usize = 400;

/// Default idle-unload timer for the LLM gateway, in seconds; 0 disables it (§4.2).
pub const DEFAULT_IDLE_UNLOAD_SECS: u64 = 120;

/// Timeout race used when disposing LLM gateway resources, to avoid deadlock (§4.2).
pub const DISPOSE_TIMEOUT_MS: u64 = 1_000;

/// Default k-NN neighbor count used by A-MEM link generation (§4.4).
pub const AMEM_DEFAULT_K: usize = 8;

/// Maximum neighbors gathered per neighbor during evolution cascades (§4.4).
pub const AMEM_EVOLVE_NEIGHBOR_LIMIT: usize = 5;

/// Minimum confidence for an accepted causal inference pair (§4.4).
pub const CAUSAL_MIN_CONFIDENCE: f64 = 0.6;

/// Default semantic-graph neighbor cap per document (§4.5).
pub const SEMANTIC_GRAPH_MAX_NEIGHBORS: usize = 10;

/// Default semantic-graph similarity threshold (§4.5). Interpreted as a
/// similarity floor: an edge is inserted when `cosine_similarity >= threshold`,
/// equivalently `cosine_distance < 1 - threshold` (open question in §9,
/// resolved in DESIGN.md).
pub const SEMANTIC_GRAPH_THRESHOLD: f32 = 0.7;

/// Intent-classification cache TTL, in seconds (§4.6).
pub const INTENT_CACHE_TTL_SECS: i64 = 3600;

/// Heuristic-confidence floor below which LLM refinement is attempted (§4.6).
pub const INTENT_REFINEMENT_CONFIDENCE_FLOOR: f64 = 0.8;

/// Graph traversal defaults (§4.7).
pub const TRAVERSAL_MAX_DEPTH: usize = 3;
pub const TRAVERSAL_BEAM_WIDTH: usize = 8;
pub const TRAVERSAL_BUDGET: usize = 32;
pub const TRAVERSAL_LAMBDA_RELATION: f64 = 0.6;
pub const TRAVERSAL_LAMBDA_SIMILARITY: f64 = 0.4;
pub const TRAVERSAL_DECAY_GAMMA: f64 = 0.9;

/// Reciprocal rank fusion constant (§4.8).
pub const RRF_K: f64 = 60.0;
pub const RRF_RANK0_BONUS: f64 = 0.05;
pub const RRF_RANK12_BONUS: f64 = 0.02;

/// Default composite-score weights: (search, recency, confidence) (§4.8).
pub const DEFAULT_COMPOSITE_WEIGHTS: (f64, f64, f64) = (0.5, 0.25, 0.25);

/// Composite-score weights used once a recency-intent pattern matches (§4.8).
pub const RECENCY_INTENT_COMPOSITE_WEIGHTS: (f64, f64, f64) = (0.1, 0.7, 0.2);

/// Consolidation worker defaults (§4.10).
pub const CONSOLIDATION_DEFAULT_INTERVAL_SECS: u64 = 300;
pub const CONSOLIDATION_MIN_INTERVAL_SECS: u64 = 15;
pub const CONSOLIDATION_BATCH_SIZE: usize = 3;

/// Default hook dedupe window, in seconds (§6).
pub const DEFAULT_HOOK_DEDUP_WINDOW_SECS: u64 = 600;

/// Transcript file size ceiling in bytes (§6).
pub const TRANSCRIPT_MAX_BYTES: u64 = 50 * 1024 * 1024;

/// Feedback loop's minimum title length for the "title mention" heuristic
/// (§9 open question — treated as a safety guard against false positives on
/// short generic titles, not a semantic boundary; see DESIGN.md).
pub const FEEDBACK_MIN_TITLE_LEN: usize = 5;

/// Expand-query / rerank cache bound and sweep rate (§4.2).
pub const LLM_CACHE_MAX_ENTRIES: usize = 1_000;
pub const LLM_CACHE_SWEEP_PROBABILITY: f64 = 0.01;

/// Cumulative content-byte ceiling for a single `find_documents` call; once
/// exceeded, remaining matches are reported as skipped rather than fetched
/// (§4.1 finder, glossary "byte cap").
pub const FIND_DOCUMENTS_BYTE_CAP: usize = 1_000_000;

/// Minimum similarity score (`1.0 - normalized_levenshtein`) for a fuzzy
/// path match to be offered as a `find_document` suggestion (§4.1).
pub const FUZZY_PATH_SUGGESTION_FLOOR: f64 = 0.4;

/// Maximum number of fuzzy-match suggestions returned on a `find_document` miss.
pub const FUZZY_PATH_SUGGESTION_LIMIT: usize = 5;

/// Output dimension of the in-process local embedding fallback (§4.2).
/// Independent of any remote embedder's dimension; the vector table is
/// rebuilt if the two disagree (§4.1).
pub const LOCAL_EMBED_DIM: usize = 256;

/// Hard timeout race used when disposing the LLM gateway's local resources,
/// to bound worst-case shutdown latency (§4.2, §5).
pub const GENERATE_DEFAULT_TIMEOUT_MS: u64 = 30_000;
