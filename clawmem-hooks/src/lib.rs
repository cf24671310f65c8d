#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

//! # ClawMem Hooks
//!
//! Session-lifecycle hook handlers (§6 "Hook wire protocol"): one JSON
//! object in on stdin, one JSON object out on stdout, and a handler that is
//! never allowed to fail loudly. This crate owns the wire framing, dedupe
//! and heartbeat suppression, transcript parsing, and injection-block
//! formatting; the retrieval and enrichment logic it calls into lives in
//! [`clawmem_engine`].

mod dedupe;
mod handlers;
mod injection;
mod input;
mod output;
mod transcript;
mod wire;

pub use dedupe::{is_trivially_suppressed, should_suppress};
pub use handlers::{handle_session_end, handle_session_start, handle_user_prompt_submit};
pub use injection::{join_blocks, vault_context, vault_decisions, vault_handoff, vault_session, vault_staleness, wrap};
pub use input::HookInput;
pub use output::{HookOutput, HookSpecificOutput};
pub use transcript::assistant_text_from_transcript;
pub use wire::{read_request, write_response};

use clawmem_core::config::RuntimeConfig;
use clawmem_llm::{Gateway, GatewayConfig};
use clawmem_store::Store;

/// Dispatch one already-parsed [`HookInput`] to its handler and produce a
/// [`HookOutput`]. Any handler error is logged to stderr and mapped to an
/// empty response rather than propagated — hooks must never exit non-zero
/// or leave the host's prompt pipeline blocked on a retrieval failure.
pub async fn run(store: &Store, gateway: &Gateway, cfg: &RuntimeConfig, input: &HookInput) -> HookOutput {
    let event = input.hook_event_name.clone().unwrap_or_default();

    let result = match event.as_str() {
        "session-start" | "SessionStart" => handle_session_start(store, input).await,
        "user-prompt-submit" | "UserPromptSubmit" => handle_user_prompt_submit(store, gateway, cfg, input).await,
        "session-end" | "SessionEnd" | "stop" | "Stop" => handle_session_end(store, input).await,
        other => {
            tracing::warn!(hook_event_name = other, "unrecognized hook event, no-op");
            Ok(None)
        }
    };

    match result {
        Ok(Some(context)) => HookOutput::with_context(event, context),
        Ok(None) => HookOutput::empty(event),
        Err(err) => {
            tracing::warn!(error = %err, hook_event_name = %event, "hook handler failed, emitting empty output");
            HookOutput::empty(event)
        }
    }
}

/// Build a [`Gateway`] from runtime configuration.
#[must_use]
pub fn gateway_from_config(cfg: &RuntimeConfig) -> Gateway {
    Gateway::new(GatewayConfig {
        embed_url: cfg.embed_url.clone(),
        llm_url: cfg.llm_url.clone(),
        rerank_url: cfg.rerank_url.clone(),
        ..GatewayConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unrecognized_event_produces_an_empty_response() {
        let store = Store::open_in_memory().await.unwrap();
        let cfg = RuntimeConfig::default();
        let gateway = gateway_from_config(&cfg);
        let input = HookInput {
            session_id: "s1".to_string(),
            prompt: None,
            transcript_path: None,
            hook_event_name: Some("something-unknown".to_string()),
        };
        let output = run(&store, &gateway, &cfg, &input).await;
        assert!(output.hook_specific_output.additional_context.is_none());
    }

    #[tokio::test]
    async fn a_failing_handler_still_produces_a_structured_response() {
        let store = Store::open_in_memory().await.unwrap();
        let cfg = RuntimeConfig::default();
        let gateway = gateway_from_config(&cfg);
        let input = HookInput {
            session_id: "s1".to_string(),
            prompt: None,
            transcript_path: Some("relative/not-absolute.jsonl".to_string()),
            hook_event_name: Some("session-end".to_string()),
        };
        let output = run(&store, &gateway, &cfg, &input).await;
        assert_eq!(output.hook_specific_output.hook_event_name, "session-end");
        assert!(output.hook_specific_output.additional_context.is_none());
    }
}
