#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]

//! # ClawMem Core
//!
//! Shared data model, error taxonomy, configuration, and virtual-path
//! addressing for the ClawMem personal agent-memory engine.
//!
//! This crate has no storage or networking dependencies of its own — it is
//! the vocabulary the other crates (`clawmem-store`, `clawmem-llm`,
//! `clawmem-engine`, `clawmem-hooks`, `clawmem-cli`) share.
//!
//! ## Module organization
//!
//! - [`types`]: the entities of §3 (Content, Document, Embedding, RelationEdge,
//!   Evolution, IntentClassification, Session, UsageRecord, HookDedupe).
//! - [`error`]: the error taxonomy of §7.
//! - [`config`]: index configuration and runtime environment overrides (§6).
//! - [`virtual_path`]: the `clawmem://collection/path` addressing scheme and
//!   short docid helpers (§6).
//! - [`constants`]: magic numbers named throughout the spec, defined once.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod virtual_path;

pub use error::{Error, Result};
pub use types::*;
