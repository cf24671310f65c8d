//! `clawmem doc show <reference>`: resolve a virtual path, short docid, or
//! fuzzy path reference to its document and content (§4.1 finder).

use clawmem_core::types::Document;
use serde::Serialize;

use crate::context::AppContext;
use crate::output::Output;

#[derive(Debug, Serialize)]
pub struct DocCommandResult {
    pub document: Document,
    pub body: Option<String>,
}

impl Output for DocCommandResult {
    fn write_human<W: std::io::Write>(&self, mut writer: W) -> anyhow::Result<()> {
        writeln!(writer, "{} ({:?})", self.document.title, self.document.content_type)?;
        writeln!(writer, "{}/{}", self.document.collection, self.document.path)?;
        writeln!(writer, "access_count={} confidence={:.2}", self.document.access_count, self.document.confidence)?;
        if let Some(body) = &self.body {
            writeln!(writer)?;
            writeln!(writer, "{body}")?;
        }
        Ok(())
    }
}

pub async fn run(ctx: &AppContext, reference: &str) -> anyhow::Result<DocCommandResult> {
    let found = ctx.store.find_document(reference).await?;
    let body = ctx.store.get_content(&found.document.hash).await?;
    Ok(DocCommandResult { document: found.document, body })
}
