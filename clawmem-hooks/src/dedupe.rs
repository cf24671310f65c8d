//! Heartbeat and dedup suppression (§6 "Dedup & heartbeat suppression").
//!
//! A prompt is dropped before any retrieval work happens if it is empty,
//! starts with `/` (a host slash-command, not conversational text), matches
//! a heartbeat pattern, or was already seen for this hook within the
//! configured window.

use sha2::{Digest, Sha256};

use clawmem_core::config::RuntimeConfig;
use clawmem_core::Result;
use clawmem_store::Store;

const PREVIEW_CHARS: usize = 120;

/// Whether `prompt` should be silently dropped without reaching the store
/// or the gateway at all: empty, a slash-command, or a heartbeat pattern.
#[must_use]
pub fn is_trivially_suppressed(prompt: &str, cfg: &RuntimeConfig) -> bool {
    let trimmed = prompt.trim();
    if trimmed.is_empty() || trimmed.starts_with('/') {
        return true;
    }
    if cfg.disable_heartbeat_suppression {
        return false;
    }
    cfg.heartbeat_patterns.iter().any(|pattern| trimmed.contains(pattern.as_str()))
}

/// Whether `(hook_name, prompt)` was already seen within the dedupe window,
/// consulting and then refreshing the bookkeeping row. Returns `true` when
/// the caller should suppress this invocation.
pub async fn should_suppress(store: &Store, hook_name: &str, prompt: &str, cfg: &RuntimeConfig) -> Result<bool> {
    let hash = prompt_hash(prompt);
    let seen_recently = match store.get_hook_dedupe(hook_name, &hash).await? {
        Some(record) => {
            let age = chrono::Utc::now().signed_duration_since(record.last_seen_at).num_seconds();
            age >= 0 && (age as u64) < cfg.hook_dedup_window_secs
        }
        None => false,
    };

    let preview: String = prompt.chars().take(PREVIEW_CHARS).collect();
    store.put_hook_dedupe(hook_name, &hash, &preview).await?;

    Ok(seen_recently)
}

fn prompt_hash(prompt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(prompt.as_bytes());
    format!("{:x}", hasher.finalize())
}
