//! `clawmem health`: a quick diagnostic snapshot of the store and gateway.

use serde::Serialize;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Serialize)]
pub struct HealthCommandResult {
    pub db_path: String,
    pub active_documents: usize,
    pub enriched_documents: usize,
    pub gateway_idle: bool,
}

impl Output for HealthCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "db: {}", self.db_path)?;
        writeln!(writer, "active documents: {}", self.active_documents)?;
        writeln!(writer, "enriched documents: {}", self.enriched_documents)?;
        writeln!(writer, "gateway idle: {}", self.gateway_idle)?;
        Ok(())
    }
}

pub async fn run(ctx: &AppContext) -> anyhow::Result<HealthCommandResult> {
    let documents = ctx.store.active_documents().await?;
    let enriched = documents.iter().filter(|d| d.is_enriched()).count();
    Ok(HealthCommandResult {
        db_path: ctx.runtime_config.resolve_db_path().display().to_string(),
        active_documents: documents.len(),
        enriched_documents: enriched,
        gateway_idle: ctx.gateway.is_idle(),
    })
}
