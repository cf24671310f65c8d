#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # ClawMem Store
//!
//! The embedded content-addressable document store (§4.1, component C1):
//! content blobs, documents, full-text search, vector search, the relation
//! graph, evolution history, intent cache, and session/usage bookkeeping —
//! all backed by a single libSQL (SQLite-compatible) database file in WAL
//! mode with foreign keys on.
//!
//! Mirrors the teacher's `memory-storage-turso` crate: a thin `Store` handle
//! wraps a [`libsql::Database`], and every operation opens a fresh
//! [`libsql::Connection`] from it (`Store::conn`), matching the teacher's
//! `get_connection()` pattern rather than holding one connection behind a
//! lock for the process lifetime.
//!
//! **Critical implementation note** (§4.1): the vector virtual table must
//! never be joined in the same query as a regular table — libSQL's
//! `vector_top_k` table-valued function is resolved before ordinary joins
//! are planned and a naive single-query join hangs. [`vector::search_vec`]
//! is strictly two-step: a k-NN query first, then a dictionary join on the
//! resulting `(hash)` set.

mod content;
mod documents;
mod evolution;
mod finder;
mod fts;
mod graph;
mod intent_cache;
mod maintenance;
mod schema;
mod session;
mod store;
mod vector;

pub use clawmem_core::types::{
    Content, ContentType, Document, Embedding, Evolution, FragmentType, HookDedupeRecord,
    IntentClassification, RelationEdge, RelationType, ResultSource, Session, UsageRecord,
};
pub use clawmem_core::{Error, Result};

pub use content::hash_body;
pub use documents::{UpsertOutcome, UpsertRequest};
pub use finder::{FindDocumentsItem, FoundDocument};
pub use fts::FtsHit;
pub use maintenance::CleanupReport;
pub use store::Store;
pub use vector::VecHit;
