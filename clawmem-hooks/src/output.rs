//! The single JSON object every hook handler writes on stdout (§6).

use serde::Serialize;

/// Top-level hook response envelope.
#[derive(Debug, Clone, Serialize)]
pub struct HookOutput {
    #[serde(rename = "hookSpecificOutput")]
    pub hook_specific_output: HookSpecificOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct HookSpecificOutput {
    #[serde(rename = "hookEventName")]
    pub hook_event_name: String,
    #[serde(rename = "additionalContext", skip_serializing_if = "Option::is_none")]
    pub additional_context: Option<String>,
}

impl HookOutput {
    /// An output carrying injected context for the host to splice into the
    /// conversation.
    #[must_use]
    pub fn with_context(hook_event_name: impl Into<String>, additional_context: String) -> Self {
        HookOutput {
            hook_specific_output: HookSpecificOutput {
                hook_event_name: hook_event_name.into(),
                additional_context: Some(additional_context),
            },
        }
    }

    /// The empty response: no context to inject, or the handler failed and
    /// is producing a structured no-op rather than propagating the error
    /// (§5 "Hook handlers must never throw").
    #[must_use]
    pub fn empty(hook_event_name: impl Into<String>) -> Self {
        HookOutput {
            hook_specific_output: HookSpecificOutput { hook_event_name: hook_event_name.into(), additional_context: None },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_omits_additional_context() {
        let out = HookOutput::empty("session-start");
        let json = serde_json::to_string(&out).unwrap();
        assert_eq!(json, r#"{"hookSpecificOutput":{"hookEventName":"session-start"}}"#);
    }

    #[test]
    fn context_output_carries_the_payload() {
        let out = HookOutput::with_context("session-start", "<vault-context>hi</vault-context>".to_string());
        let json = serde_json::to_string(&out).unwrap();
        assert!(json.contains(r#""additionalContext":"<vault-context>hi</vault-context>""#));
    }
}
