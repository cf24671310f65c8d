//! Per-event hook handlers. Each returns the `additionalContext` body (or
//! `None` when there's nothing to inject) and is responsible for its own
//! usage-record bookkeeping; callers never see a handler-internal error
//! (§5 "Hook handlers must never throw") — [`crate::run`] is where those get
//! swallowed into an empty response.

use clawmem_core::config::RuntimeConfig;
use clawmem_core::types::ContentType;
use clawmem_core::virtual_path::build_virtual_path;
use clawmem_core::Result;
use clawmem_engine::intent_aware_search;
use clawmem_llm::Gateway;
use clawmem_store::Store;

use crate::dedupe::{is_trivially_suppressed, should_suppress};
use crate::injection::{join_blocks, vault_context, vault_decisions, vault_handoff, vault_session};
use crate::input::HookInput;
use crate::transcript::assistant_text_from_transcript;

const SESSION_START_DECISIONS_LIMIT: usize = 5;
const RETRIEVAL_LIMIT: usize = 8;
const SESSION_MACHINE_FALLBACK: &str = "unknown";

/// Rough token estimate (characters / 4) used only to size the usage record,
/// not to enforce any budget.
fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

pub async fn handle_session_start(store: &Store, input: &HookInput) -> Result<Option<String>> {
    store.start_session(&input.session_id, SESSION_MACHINE_FALLBACK).await?;

    let mut documents = store.active_documents().await?;
    documents.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));

    let handoff = documents.iter().find(|d| d.content_type == ContentType::Handoff);
    let decisions: Vec<_> = documents.iter().filter(|d| d.content_type == ContentType::Decision).take(SESSION_START_DECISIONS_LIMIT).collect();

    let mut injected_paths = Vec::new();
    let mut blocks = Vec::new();

    if let Some(doc) = handoff {
        let path = build_virtual_path(&doc.collection, &doc.path);
        if let Some(body) = store.get_content(&doc.hash).await? {
            blocks.push(vault_handoff(&format!("{}\n\n{body}", doc.title)));
            injected_paths.push(path);
        }
    }

    if !decisions.is_empty() {
        let list = decisions
            .iter()
            .map(|d| format!("- {} ({})", d.title, build_virtual_path(&d.collection, &d.path)))
            .collect::<Vec<_>>()
            .join("\n");
        blocks.push(vault_decisions(&list));
        injected_paths.extend(decisions.iter().map(|d| build_virtual_path(&d.collection, &d.path)));
    }

    let context = join_blocks(&blocks).map(|body| vault_session(&body));
    if let Some(context) = &context {
        store.insert_usage_record(&input.session_id, "session-start", &injected_paths, estimate_tokens(context)).await?;
    }
    Ok(context)
}

pub async fn handle_user_prompt_submit(
    store: &Store,
    gateway: &Gateway,
    cfg: &RuntimeConfig,
    input: &HookInput,
) -> Result<Option<String>> {
    let Some(prompt) = input.prompt.as_deref().filter(|p| !p.trim().is_empty()) else {
        return Ok(None);
    };
    if is_trivially_suppressed(prompt, cfg) {
        return Ok(None);
    }
    if should_suppress(store, "user-prompt-submit", prompt, cfg).await? {
        return Ok(None);
    }

    let results = intent_aware_search(store, gateway, prompt, RETRIEVAL_LIMIT, true, None).await?;
    if results.is_empty() {
        return Ok(None);
    }

    let body = results
        .iter()
        .map(|r| format!("## {} ({})\n{}", r.title, r.file, r.snippet))
        .collect::<Vec<_>>()
        .join("\n\n");
    let injected_paths: Vec<String> = results.iter().map(|r| r.file.clone()).collect();
    let context = vault_context(&body);

    store
        .insert_usage_record(&input.session_id, "user-prompt-submit", &injected_paths, estimate_tokens(&context))
        .await?;
    Ok(Some(context))
}

pub async fn handle_session_end(store: &Store, input: &HookInput) -> Result<Option<String>> {
    if let Some(transcript_path) = &input.transcript_path {
        let assistant_text = assistant_text_from_transcript(transcript_path)?;
        clawmem_engine::process_session_feedback(store, &input.session_id, &assistant_text).await?;
    }
    store.end_session(&input.session_id, None, &[], None).await?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clawmem_core::types::ContentType as CT;
    use clawmem_llm::GatewayConfig;
    use clawmem_store::UpsertRequest;

    fn local_gateway() -> Gateway {
        Gateway::new(GatewayConfig { idle_unload_secs: 0, ..GatewayConfig::default() })
    }

    async fn seeded_store() -> Store {
        let store = Store::open_in_memory().await.unwrap();
        let hash = store.insert_content("we decided to use sqlite via libsql").await.unwrap();
        store
            .upsert_document(UpsertRequest {
                collection: "notes",
                path: "decision-sqlite.md",
                title: "Decision: use sqlite",
                hash: &hash,
                content_hash: "c1",
                content_type: CT::Decision,
                domain: None,
                workstream: None,
                tags: &[],
            })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn session_start_injects_recent_decisions() {
        let store = seeded_store().await;
        let input = HookInput { session_id: "s1".to_string(), prompt: None, transcript_path: None, hook_event_name: None };
        let context = handle_session_start(&store, &input).await.unwrap();
        assert!(context.unwrap().contains("<vault-decisions>"));
    }

    #[tokio::test]
    async fn session_start_with_no_documents_injects_nothing() {
        let store = Store::open_in_memory().await.unwrap();
        let input = HookInput { session_id: "s1".to_string(), prompt: None, transcript_path: None, hook_event_name: None };
        assert!(handle_session_start(&store, &input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_prompt_submit_with_empty_prompt_injects_nothing() {
        let store = seeded_store().await;
        let gateway = local_gateway();
        let cfg = RuntimeConfig::default();
        store.start_session("s1", "laptop").await.unwrap();
        let input = HookInput { session_id: "s1".to_string(), prompt: Some(String::new()), transcript_path: None, hook_event_name: None };
        assert!(handle_user_prompt_submit(&store, &gateway, &cfg, &input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn user_prompt_submit_finds_the_matching_document() {
        let store = seeded_store().await;
        let gateway = local_gateway();
        let cfg = RuntimeConfig::default();
        store.start_session("s1", "laptop").await.unwrap();
        let input = HookInput {
            session_id: "s1".to_string(),
            prompt: Some("why did we pick sqlite".to_string()),
            transcript_path: None,
            hook_event_name: None,
        };
        let context = handle_user_prompt_submit(&store, &gateway, &cfg, &input).await.unwrap().unwrap();
        assert!(context.contains("<vault-context>"));
    }

    #[tokio::test]
    async fn session_end_without_transcript_just_closes_the_session() {
        let store = seeded_store().await;
        store.start_session("s1", "laptop").await.unwrap();
        let input = HookInput { session_id: "s1".to_string(), prompt: None, transcript_path: None, hook_event_name: None };
        assert!(handle_session_end(&store, &input).await.unwrap().is_none());
        let session = store.get_session("s1").await.unwrap().unwrap();
        assert!(session.ended_at.is_some());
    }
}
