//! `clawmem search`: run one of the four retrieval pipelines (§4.9) against
//! the store.

use clap::ValueEnum;
use clawmem_engine::{hybrid_search, intent_aware_search, keyword_search, vector_search, RetrievalResult};
use serde::Serialize;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SearchMode {
    Keyword,
    Vector,
    Hybrid,
    Intent,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchCommandResult {
    pub results: Vec<RetrievalResult>,
}

impl Output for SearchCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        if self.results.is_empty() {
            writeln!(writer, "no results")?;
            return Ok(());
        }
        for hit in &self.results {
            writeln!(writer, "{} {} (score={:.3})", hit.docid, hit.file, hit.composite_score)?;
            writeln!(writer, "  {}", hit.title)?;
            for line in hit.snippet.lines().take(4) {
                writeln!(writer, "  {line}")?;
            }
        }
        Ok(())
    }
}

pub async fn run(
    ctx: &AppContext,
    query: &str,
    mode: SearchMode,
    limit: usize,
    collection: Option<&str>,
) -> anyhow::Result<SearchCommandResult> {
    let results = match mode {
        SearchMode::Keyword => keyword_search(&ctx.store, query, limit, collection).await?,
        SearchMode::Vector => vector_search(&ctx.store, &ctx.gateway, query, limit, collection).await?,
        SearchMode::Hybrid => hybrid_search(&ctx.store, &ctx.gateway, query, limit, collection).await?,
        SearchMode::Intent => intent_aware_search(&ctx.store, &ctx.gateway, query, limit, true, collection).await?,
    };
    Ok(SearchCommandResult { results })
}
