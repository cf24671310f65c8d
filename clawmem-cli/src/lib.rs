#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # ClawMem CLI
//!
//! The operator-facing surface over [`clawmem_store`], [`clawmem_llm`], and
//! [`clawmem_engine`]: indexing, search, document lookup, configuration
//! inspection, health, and maintenance (§6, §9).

pub mod commands;
pub mod context;
pub mod output;
