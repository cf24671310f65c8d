//! Periodic consolidation worker (§4.10, component C10): sweeps active
//! documents missing A-MEM notes and runs construct-note/generate-links for
//! them, skipping evolution to avoid retroactive cascades from a background
//! tick.

use std::sync::atomic::{AtomicBool, Ordering};

use clawmem_core::constants::{CONSOLIDATION_BATCH_SIZE, CONSOLIDATION_MIN_INTERVAL_SECS};
use clawmem_core::Result;
use clawmem_llm::Gateway;
use clawmem_store::Store;
use tracing::warn;

use crate::amem::{construct_note, generate_links};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ConsolidationReport {
    pub considered: usize,
    pub enriched: usize,
    pub failed: usize,
}

/// Clamp a requested tick interval to [`CONSOLIDATION_MIN_INTERVAL_SECS`].
#[must_use]
pub fn clamp_interval(requested_secs: u64) -> u64 {
    requested_secs.max(CONSOLIDATION_MIN_INTERVAL_SECS)
}

/// Reentrancy-guarded consolidation tick driver. A caller typically owns one
/// of these behind an `Arc` and calls [`ConsolidationWorker::tick`] on a
/// periodic timer (`clawmem-hooks` or a long-running daemon), rather than
/// this module spawning its own loop.
pub struct ConsolidationWorker {
    running: AtomicBool,
}

impl Default for ConsolidationWorker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConsolidationWorker {
    #[must_use]
    pub fn new() -> Self {
        ConsolidationWorker { running: AtomicBool::new(false) }
    }

    /// Run one consolidation batch. Returns an empty report without touching
    /// the store if a tick is already in flight (§4.10's boolean reentrancy
    /// guard).
    pub async fn tick(&self, store: &Store, gateway: &Gateway) -> Result<ConsolidationReport> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(ConsolidationReport::default());
        }
        let _guard = ResetOnDrop(&self.running);

        let documents = store.documents_missing_notes(CONSOLIDATION_BATCH_SIZE).await?;
        let mut report = ConsolidationReport { considered: documents.len(), ..ConsolidationReport::default() };

        for document in documents {
            if let Err(err) = construct_note(store, gateway, document.id).await {
                warn!(document_id = document.id, error = %err, "consolidation: construct_note failed");
                report.failed += 1;
                continue;
            }
            if let Err(err) = generate_links(store, gateway, document.id).await {
                warn!(document_id = document.id, error = %err, "consolidation: generate_links failed");
                report.failed += 1;
                continue;
            }
            report.enriched += 1;
        }

        Ok(report)
    }
}

struct ResetOnDrop<'a>(&'a AtomicBool);

impl Drop for ResetOnDrop<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
