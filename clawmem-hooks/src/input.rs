//! The payload every hook handler reads on stdin (§6 "Hook wire protocol").

use serde::Deserialize;

/// One hook invocation. Both snake_case and camelCase field names are
/// accepted since the host agent is not guaranteed to normalize its casing.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    #[serde(alias = "sessionId")]
    pub session_id: String,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default, alias = "transcriptPath")]
    pub transcript_path: Option<String>,
    #[serde(default, alias = "hookEventName")]
    pub hook_event_name: Option<String>,
}
