//! Error taxonomy for the ClawMem engine (§7).
//!
//! The taxonomy is a fixed set of codes, not a tree of exception types: every
//! crate in the workspace maps its internal failures onto one of these
//! variants before the error crosses a crate boundary, so no raw SQL strings
//! or driver internals ever reach a caller-visible message.

/// Result type alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, Error>;

/// The ClawMem error taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("input too long: {actual} bytes exceeds the {limit}-byte cap")]
    InputTooLong { actual: usize, limit: usize },

    #[error("value out of bounds: {0}")]
    OutOfBounds(String),

    #[error("invalid number: {0}")]
    InvalidNumber(String),

    #[error("length mismatch: {0}")]
    LengthMismatch(String),

    #[error("path too long: {actual} exceeds {limit}")]
    PathTooLong { actual: usize, limit: usize },

    #[error("path traversal rejected: {0}")]
    PathTraversal(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("not found: {message}")]
    NotFound {
        message: String,
        suggestions: Vec<String>,
    },

    #[error("vector index missing: embed the collection before running vector search")]
    VectorIndexMissing,

    #[error("remote backend unavailable: {reason}")]
    RemoteUnavailable { reason: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl Error {
    /// Validation-class errors surface code + message directly to the caller
    /// (§7's "propagation policy"); this is everything except [`Error::Internal`].
    #[must_use]
    pub fn is_validation(&self) -> bool {
        !matches!(self, Error::Internal(_))
    }

    /// Whether the remote LLM/embedder caller should fall back to the local
    /// in-process model rather than surface this error.
    #[must_use]
    pub fn should_fallback_local(&self) -> bool {
        matches!(self, Error::RemoteUnavailable { .. })
    }

    pub fn not_found(message: impl Into<String>, suggestions: Vec<String>) -> Self {
        Error::NotFound {
            message: message.into(),
            suggestions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_not_internal() {
        let err = Error::InvalidPath("../../etc/passwd".to_string());
        assert!(err.is_validation());
    }

    #[test]
    fn remote_unavailable_triggers_fallback() {
        let err = Error::RemoteUnavailable {
            reason: "connection refused".to_string(),
        };
        assert!(err.should_fallback_local());
        assert!(!Error::VectorIndexMissing.should_fallback_local());
    }

    #[test]
    fn not_found_carries_suggestions() {
        let err = Error::not_found("no such document", vec!["notes/decision.md".to_string()]);
        match err {
            Error::NotFound { suggestions, .. } => assert_eq!(suggestions.len(), 1),
            _ => panic!("expected NotFound"),
        }
    }
}
