//! `clawmem index`: walk every configured collection (or just `--collection
//! NAME`), indexing changed files and kicking A-MEM enrichment for each one
//! touched (§4.3, §4.4).

use clawmem_core::config::CollectionConfig;
use clawmem_engine::{index_collection, IndexReport};
use serde::Serialize;
use tracing::warn;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Default, Serialize)]
pub struct IndexCommandResult {
    pub collections: Vec<(String, IndexReport)>,
}

impl Output for IndexCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        for (name, report) in &self.collections {
            writeln!(
                writer,
                "{name}: +{} ~{} reactivated={} unchanged={} deactivated={} failed={}",
                report.inserted, report.updated, report.reactivated, report.unchanged, report.deactivated, report.failed
            )?;
        }
        Ok(())
    }
}

pub async fn run(ctx: &AppContext, collection_filter: Option<&str>) -> anyhow::Result<IndexCommandResult> {
    let mut result = IndexCommandResult::default();
    let enable_amem = ctx.runtime_config.enable_amem;

    let collections: Vec<&CollectionConfig> = ctx
        .index_config
        .collections
        .iter()
        .filter(|c| collection_filter.is_none_or(|f| f == c.name))
        .collect();

    for collection in collections {
        let report = index_collection(&ctx.store, &ctx.gateway, collection, |document_id, is_new| async move {
            if !enable_amem {
                return;
            }
            if let Err(err) = clawmem_engine::enrich(&ctx.store, &ctx.gateway, document_id, is_new).await {
                warn!(document_id, error = %err, "A-MEM enrichment failed, continuing");
            }
        })
        .await?;
        result.collections.push((collection.name.clone(), report));
    }

    Ok(result)
}
