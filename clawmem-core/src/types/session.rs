use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A host-agent session (§3 "Session"), uniquely identified by `session_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub handoff_path: Option<String>,
    pub machine: String,
    pub files_changed: Vec<String>,
    pub summary: Option<String>,
}

/// A record of one hook-injected context payload (§3 "Usage record"), used
/// by the feedback loop (§4.11) to attribute reference signals back onto the
/// injected documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub id: i64,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub hook_name: String,
    pub injected_paths: Vec<String>,
    pub estimated_tokens: u64,
    pub was_referenced: bool,
}

/// A hook-dedupe bookkeeping row (§3 "Hook-dedupe record"), keyed by
/// `(hook_name, prompt_hash)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookDedupeRecord {
    pub hook_name: String,
    pub prompt_hash: String,
    pub last_seen_at: DateTime<Utc>,
    pub preview: String,
}
