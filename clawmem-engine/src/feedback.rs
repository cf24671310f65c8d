//! Session-end feedback loop (§4.11, component C11): attribute assistant
//! mentions back onto the documents a hook injected, feeding the access
//! count that composite scoring's confidence term reads (§4.8).

use clawmem_core::constants::FEEDBACK_MIN_TITLE_LEN;
use clawmem_core::types::Document;
use clawmem_core::Result;
use clawmem_store::Store;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct FeedbackReport {
    pub records_scanned: usize,
    pub records_credited: usize,
    pub documents_credited: usize,
}

/// Scan every unreferenced usage record for `session_id` against
/// `assistant_text` (the assistant-authored portion of the transcript), and
/// credit any injected path that's mentioned by file path, bare filename, or
/// stored title.
pub async fn process_session_feedback(store: &Store, session_id: &str, assistant_text: &str) -> Result<FeedbackReport> {
    let records = store.unreferenced_usage_records(session_id).await?;
    let mut report = FeedbackReport { records_scanned: records.len(), ..FeedbackReport::default() };

    for record in &records {
        let mut record_matched = false;

        for injected_path in &record.injected_paths {
            let Ok(found) = store.find_document(injected_path).await else { continue };
            if !is_mentioned(assistant_text, injected_path, &found.document) {
                continue;
            }
            store.record_access(found.document.id).await?;
            report.documents_credited += 1;
            record_matched = true;
        }

        if record_matched {
            store.mark_usage_referenced(record.id).await?;
            report.records_credited += 1;
        }
    }

    Ok(report)
}

/// Whether `text` plausibly references `document` via its injected path
/// (exact path, bare filename, or stored title). The title check is skipped
/// below [`FEEDBACK_MIN_TITLE_LEN`] to avoid false positives on short,
/// generic titles like "Notes".
fn is_mentioned(text: &str, injected_path: &str, document: &Document) -> bool {
    if text.contains(injected_path) {
        return true;
    }
    let filename = injected_path.rsplit('/').next().unwrap_or(injected_path);
    if !filename.is_empty() && text.contains(filename) {
        return true;
    }
    if document.title.len() >= FEEDBACK_MIN_TITLE_LEN && text.contains(document.title.as_str()) {
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_core::types::ContentType;
    use clawmem_store::UpsertRequest;

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("body").await.unwrap();
        store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "decision-sqlite.md",
                title: "Decision: use sqlite",
                hash: &hash,
                content_hash: "c1",
                content_type: ContentType::Decision,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn mention_of_bare_filename_credits_the_document() {
        let store = seeded_store().await;
        store.start_session("s1", "laptop").await.unwrap();
        store
            .insert_usage_record("s1", "session-start", &["clawmem://notes/decision-sqlite.md".to_string()], 50)
            .await
            .unwrap();

        let report = process_session_feedback(&store, "s1", "As noted in decision-sqlite.md, we picked libsql.")
            .await
            .unwrap();
        assert_eq!(report.documents_credited, 1);
        assert_eq!(report.records_credited, 1);

        let pending = store.unreferenced_usage_records("s1").await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn no_mention_leaves_the_record_unreferenced() {
        let store = seeded_store().await;
        store.start_session("s1", "laptop").await.unwrap();
        store
            .insert_usage_record("s1", "session-start", &["clawmem://notes/decision-sqlite.md".to_string()], 50)
            .await
            .unwrap();

        let report = process_session_feedback(&store, "s1", "unrelated assistant text").await.unwrap();
        assert_eq!(report.documents_credited, 0);
        assert_eq!(report.records_credited, 0);
    }

    #[tokio::test]
    async fn unresolvable_injected_path_is_skipped_without_error() {
        let store = seeded_store().await;
        store.start_session("s1", "laptop").await.unwrap();
        store
            .insert_usage_record("s1", "session-start", &["clawmem://notes/missing.md".to_string()], 10)
            .await
            .unwrap();

        let report = process_session_feedback(&store, "s1", "missing.md").await.unwrap();
        assert_eq!(report.documents_credited, 0);
    }
}
