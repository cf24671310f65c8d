//! Collection walk and indexing pipeline (§4.3, component C3).
//!
//! Mirrors the teacher's ingestion loop: walk the filesystem, hash each file
//! to short-circuit unchanged content, and only pay for re-embedding when the
//! body actually moved.

use std::collections::HashSet;
use std::future::Future;
use std::path::Path;

use clawmem_core::config::CollectionConfig;
use clawmem_core::constants::EXCLUDED_DIRECTORIES;
use clawmem_core::types::ContentType;
use clawmem_core::Result;
use clawmem_llm::{EmbedOptions, Gateway};
use clawmem_store::{hash_body, Store, UpsertOutcome, UpsertRequest};
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::frontmatter::{first_heading, parse_frontmatter, Frontmatter};
use crate::glob;
use crate::splitter::{split_document, SplitContext};

/// Tally of what a collection walk did (§4.3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct IndexReport {
    pub inserted: usize,
    pub updated: usize,
    pub reactivated: usize,
    pub unchanged: usize,
    pub deactivated: usize,
    pub failed: usize,
}

impl IndexReport {
    fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
            UpsertOutcome::Reactivated => self.reactivated += 1,
            UpsertOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Walk one configured collection: index new/changed files, deactivate rows
/// for files no longer on disk (§8 invariant 2). `on_indexed(id, is_new)` is
/// invoked for every document that was inserted, reactivated, or updated, so
/// the caller can kick A-MEM enrichment (§4.4) without this module depending
/// on it directly.
pub async fn index_collection<F, Fut>(
    store: &Store,
    gateway: &Gateway,
    collection: &CollectionConfig,
    mut on_indexed: F,
) -> Result<IndexReport>
where
    F: FnMut(i64, bool) -> Fut,
    Fut: Future<Output = ()>,
{
    let mut report = IndexReport::default();
    let mut seen_paths: HashSet<String> = HashSet::new();
    let patterns = glob::brace_expand(&collection.pattern);

    for entry in WalkDir::new(&collection.path).into_iter().filter_entry(|e| !is_excluded_dir(e)) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(?err, "walk error, skipping entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&collection.path) else {
            continue;
        };
        let rel_path = rel.to_string_lossy().replace('\\', "/");
        if !patterns.iter().any(|pattern| glob::matches(pattern, &rel_path)) {
            continue;
        }
        seen_paths.insert(rel_path.clone());

        match index_file(store, gateway, collection, entry.path(), &rel_path).await {
            Ok(Some((id, outcome, is_new))) => {
                report.record(outcome);
                if outcome != UpsertOutcome::Unchanged {
                    on_indexed(id, is_new).await;
                }
            }
            Ok(None) => {}
            Err(err) => {
                warn!(path = %rel_path, ?err, "failed to index file");
                report.failed += 1;
            }
        }
    }

    for doc in store.active_documents_in_collection(&collection.name).await? {
        if !seen_paths.contains(&doc.path) {
            store.deactivate_document(doc.id).await?;
            report.deactivated += 1;
        }
    }

    Ok(report)
}

fn is_excluded_dir(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRECTORIES.contains(&name))
}

async fn index_file(
    store: &Store,
    gateway: &Gateway,
    collection: &CollectionConfig,
    abs_path: &Path,
    rel_path: &str,
) -> Result<Option<(i64, UpsertOutcome, bool)>> {
    let raw = match std::fs::read_to_string(abs_path) {
        Ok(s) => s,
        Err(err) => {
            debug!(path = %rel_path, ?err, "unreadable or not valid utf-8, skipping");
            return Ok(None);
        }
    };

    let content_hash = hash_body(&raw);
    let (frontmatter, body) = parse_frontmatter(&raw);
    let body_hash = store.insert_content(&body).await?;

    let title = frontmatter
        .title
        .clone()
        .or_else(|| first_heading(&body))
        .unwrap_or_else(|| fallback_title(rel_path));

    let content_type = frontmatter
        .content_type
        .as_deref()
        .map(|s| s.parse::<ContentType>().unwrap_or(ContentType::Other))
        .unwrap_or_else(|| ContentType::infer_from_path(rel_path));

    let domain = frontmatter.domain.as_deref().or_else(|| collection.context.get("domain").map(String::as_str));
    let workstream = frontmatter
        .workstream
        .as_deref()
        .or_else(|| collection.context.get("workstream").map(String::as_str));

    let (id, outcome) = store
        .upsert_document(UpsertRequest {
            collection: &collection.name,
            path: rel_path,
            title: &title,
            hash: &body_hash,
            content_hash: &content_hash,
            content_type,
            domain,
            workstream,
            tags: &frontmatter.tags,
        })
        .await?;

    if outcome == UpsertOutcome::Unchanged {
        return Ok(Some((id, outcome, false)));
    }

    embed_fragments(store, gateway, id, &body_hash, &body, &frontmatter, &title).await;

    let is_new = outcome == UpsertOutcome::Inserted;
    Ok(Some((id, outcome, is_new)))
}

fn fallback_title(rel_path: &str) -> String {
    Path::new(rel_path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| rel_path.to_string())
}

/// Split the body into fragments and embed each one, tolerating individual
/// fragment failures (§4.3: one bad fragment never aborts the whole file).
async fn embed_fragments(
    store: &Store,
    gateway: &Gateway,
    id: i64,
    body_hash: &str,
    body: &str,
    frontmatter: &Frontmatter,
    title: &str,
) {
    let document = match store.get_document(id).await {
        Ok(d) => d,
        Err(err) => {
            warn!(?err, id, "failed to reload document for fragment context");
            None
        }
    };

    let context = SplitContext {
        frontmatter: frontmatter.extra.clone(),
        observation_facts: document.as_ref().and_then(|d| d.observation_facts.clone()).unwrap_or_default(),
        observation_narrative: document.and_then(|d| d.observation_narrative),
    };

    for (seq, fragment) in split_document(body, &context).into_iter().enumerate() {
        let opts = EmbedOptions { is_query: false, title: Some(title.to_string()) };
        let embedded = match gateway.embed(&fragment.text, &opts).await {
            Ok(e) => e,
            Err(err) => {
                warn!(?err, seq, "failed to embed fragment, skipping");
                continue;
            }
        };
        if let Err(err) = store
            .insert_embedding(
                body_hash,
                seq as u32,
                fragment.pos,
                &embedded.model,
                fragment.kind,
                fragment.label.as_deref(),
                &embedded.vector,
            )
            .await
        {
            warn!(?err, seq, "failed to persist fragment embedding");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_llm::GatewayConfig;
    use std::collections::HashMap;

    fn local_gateway() -> Gateway {
        Gateway::new(GatewayConfig {
            embed_model: "local".to_string(),
            llm_model: "local".to_string(),
            rerank_model: "local".to_string(),
            ..GatewayConfig::default()
        })
    }

    fn collection(name: &str, path: &std::path::Path) -> CollectionConfig {
        CollectionConfig {
            name: name.to_string(),
            path: path.to_path_buf(),
            pattern: "**/*.md".to_string(),
            context: HashMap::new(),
            update: None,
        }
    }

    #[tokio::test]
    async fn indexes_new_markdown_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Title\n\nSome body text here.").unwrap();

        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let report = index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {})
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
        let docs = store.active_documents_in_collection("notes").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].title, "Title");
    }

    #[tokio::test]
    async fn excludes_ignored_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("node_modules")).unwrap();
        std::fs::write(dir.path().join("node_modules/skip.md"), "# Skip").unwrap();
        std::fs::write(dir.path().join("keep.md"), "# Keep").unwrap();

        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let report = index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {})
            .await
            .unwrap();

        assert_eq!(report.inserted, 1);
    }

    #[tokio::test]
    async fn unchanged_file_is_a_noop_on_second_walk() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Title\n\nbody").unwrap();

        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {}).await.unwrap();
        let report = index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {})
            .await
            .unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.inserted, 0);
    }

    #[tokio::test]
    async fn deleted_file_deactivates_its_document() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.md");
        std::fs::write(&file_path, "# Title\n\nbody").unwrap();

        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {}).await.unwrap();

        std::fs::remove_file(&file_path).unwrap();
        let report = index_collection(&store, &gateway, &collection("notes", dir.path()), |_, _| async {})
            .await
            .unwrap();

        assert_eq!(report.deactivated, 1);
        assert!(store.active_documents_in_collection("notes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn on_indexed_callback_fires_for_new_documents_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.md"), "# Title\n\nbody").unwrap();

        let store = Store::open_in_memory().await.unwrap();
        let gateway = local_gateway();
        let calls = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));

        let calls_clone = calls.clone();
        index_collection(&store, &gateway, &collection("notes", dir.path()), move |id, is_new| {
            let calls = calls_clone.clone();
            async move {
                calls.lock().push((id, is_new));
            }
        })
        .await
        .unwrap();

        assert_eq!(calls.lock().len(), 1);
        assert!(calls.lock()[0].1);
    }
}
