#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

//! # ClawMem LLM Gateway
//!
//! The unified embedder/generator/reranker facade (§4.2, component C2):
//! remote-first with an in-process local fallback, lazy model loading
//! guarded against concurrent double-init, an idle-unload timer, and a
//! bounded result cache for `expand_query`/`rerank`.
//!
//! Mirrors the teacher's dual remote/local dispatch in
//! `memory-core::embeddings`: every operation tries the configured remote
//! HTTP backend first and falls back to the local backend only when the
//! remote call fails with [`clawmem_core::Error::RemoteUnavailable`].

mod cache;
mod gateway;
mod local;
mod prompts;
mod remote;
mod repair;

pub use gateway::{
    EmbedOptions, EmbedResult, ExpandedQuery, Gateway, GatewayConfig, GenerateOptions,
    GenerateResult, QueryVariantKind, RerankHit,
};
pub use prompts::{
    causal_prompt, classify_relation_prompt, construct_note_prompt, evolve_note_prompt,
    intent_classification_prompt,
};
pub use repair::repair_json;
