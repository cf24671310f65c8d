//! `clawmem config show`: print the resolved index configuration and
//! environment-derived runtime configuration (§6).

use clawmem_core::config::{IndexConfig, RuntimeConfig};
use serde::Serialize;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Serialize)]
pub struct ConfigCommandResult {
    pub index: IndexConfig,
    pub db_path: std::path::PathBuf,
    pub embed_url: Option<String>,
    pub llm_url: Option<String>,
    pub rerank_url: Option<String>,
    pub enable_amem: bool,
    pub enable_consolidation: bool,
    pub consolidation_interval_secs: u64,
}

impl Output for ConfigCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "db: {}", self.db_path.display())?;
        writeln!(writer, "collections: {}", self.index.collections.len())?;
        for c in &self.index.collections {
            writeln!(writer, "  - {} -> {} ({})", c.name, c.path.display(), c.pattern)?;
        }
        writeln!(writer, "embed_url: {}", self.embed_url.as_deref().unwrap_or("(local fallback)"))?;
        writeln!(writer, "llm_url: {}", self.llm_url.as_deref().unwrap_or("(local fallback)"))?;
        writeln!(writer, "rerank_url: {}", self.rerank_url.as_deref().unwrap_or("(local fallback)"))?;
        writeln!(writer, "amem={} consolidation={} interval={}s", self.enable_amem, self.enable_consolidation, self.consolidation_interval_secs)?;
        Ok(())
    }
}

pub fn run(ctx: &AppContext) -> ConfigCommandResult {
    let rc: &RuntimeConfig = &ctx.runtime_config;
    ConfigCommandResult {
        index: ctx.index_config.clone(),
        db_path: rc.resolve_db_path(),
        embed_url: rc.embed_url.clone(),
        llm_url: rc.llm_url.clone(),
        rerank_url: rc.rerank_url.clone(),
        enable_amem: rc.enable_amem,
        enable_consolidation: rc.enable_consolidation,
        consolidation_interval_secs: rc.consolidation_interval_secs,
    }
}
