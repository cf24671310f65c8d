//! `clawmem vacuum` and `clawmem consolidate`: the two maintenance
//! operations the host never runs automatically (§4.10, §9).

use clawmem_engine::{ConsolidationReport, ConsolidationWorker};
use clawmem_store::CleanupReport;
use serde::Serialize;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Serialize)]
pub struct VacuumCommandResult {
    pub cleanup: CleanupReport,
}

impl Output for VacuumCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(
            writer,
            "removed {} orphaned content rows, {} orphaned vectors; database vacuumed",
            self.cleanup.orphaned_content_removed, self.cleanup.orphaned_vectors_removed
        )?;
        Ok(())
    }
}

pub async fn run_vacuum(ctx: &AppContext) -> anyhow::Result<VacuumCommandResult> {
    let cleanup = ctx.store.cleanup_orphans().await?;
    ctx.store.vacuum().await?;
    Ok(VacuumCommandResult { cleanup })
}

#[derive(Debug, Serialize)]
pub struct ConsolidateCommandResult {
    pub report: ConsolidationReport,
}

impl Output for ConsolidateCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(
            writer,
            "considered={} enriched={} failed={}",
            self.report.considered, self.report.enriched, self.report.failed
        )?;
        Ok(())
    }
}

pub async fn run_consolidate(ctx: &AppContext) -> anyhow::Result<ConsolidateCommandResult> {
    let worker = ConsolidationWorker::new();
    let report = worker.tick(&ctx.store, &ctx.gateway).await?;
    Ok(ConsolidateCommandResult { report })
}
