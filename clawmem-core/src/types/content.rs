use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An immutable content blob, keyed by the cryptographic digest of its body
/// (§3 "Content blob"). Garbage-collected once no active [`Document`]
/// references it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub hash: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// A document tracked by the Store (§3 "Document"). `(collection, path)` is
/// unique across all documents, active or not, so deletion followed by
/// re-appearance reactivates the same row rather than inserting a duplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub collection: String,
    pub path: String,
    pub title: String,
    /// Hash of the post-frontmatter body, pointing at the [`Content`] row.
    pub hash: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub active: bool,
    pub content_type: ContentType,
    pub domain: Option<String>,
    pub workstream: Option<String>,
    pub tags: Vec<String>,
    pub review_by: Option<DateTime<Utc>>,
    pub confidence: f64,
    pub access_count: u64,
    /// Hash of the raw file as read from disk, used for the indexer's
    /// unchanged-file short-circuit (§4.3); distinct from `hash`, which is
    /// computed over the body with frontmatter stripped.
    pub content_hash: String,
    pub amem_keywords: Option<Vec<String>>,
    pub amem_tags: Option<Vec<String>>,
    pub amem_context: Option<String>,
    pub observation_type: Option<String>,
    pub observation_facts: Option<Vec<String>>,
    pub observation_narrative: Option<String>,
    pub observation_concepts: Option<Vec<String>>,
    pub files_read: Vec<String>,
    pub files_modified: Vec<String>,
}

impl Document {
    /// Whether A-MEM has ever constructed a note for this document.
    #[must_use]
    pub fn is_enriched(&self) -> bool {
        self.amem_keywords.is_some()
    }

    /// `true` if this document carries structured observation fields —
    /// the fact/narrative fragments and causal inference apply only here.
    #[must_use]
    pub fn is_observation(&self) -> bool {
        self.observation_type.is_some()
    }
}

/// The content-type catalog referenced by §4.8's composite scoring. Values
/// outside the known set fall back to [`ContentType::Other`]; half-life and
/// confidence-baseline lookups live in `clawmem-engine::scoring` since they
/// are a scoring concern, not a storage concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Handoff,
    Progress,
    Note,
    Research,
    Project,
    Decision,
    Hub,
    Other,
}

impl ContentType {
    /// Infer a content type from path keywords, unless overridden by
    /// frontmatter (§4.8). Keyword match is on path segments, lowercased.
    #[must_use]
    pub fn infer_from_path(path: &str) -> Self {
        let lower = path.to_ascii_lowercase();
        let has = |needle: &str| lower.contains(needle);
        if has("handoff") {
            ContentType::Handoff
        } else if has("progress") || has("status") {
            ContentType::Progress
        } else if has("research") {
            ContentType::Research
        } else if has("decision") || has("adr") {
            ContentType::Decision
        } else if has("project") {
            ContentType::Project
        } else if has("hub") || has("index") {
            ContentType::Hub
        } else if has("note") {
            ContentType::Note
        } else {
            ContentType::Other
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Handoff => "handoff",
            ContentType::Progress => "progress",
            ContentType::Note => "note",
            ContentType::Research => "research",
            ContentType::Project => "project",
            ContentType::Decision => "decision",
            ContentType::Hub => "hub",
            ContentType::Other => "other",
        }
    }
}

impl std::str::FromStr for ContentType {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "handoff" => ContentType::Handoff,
            "progress" => ContentType::Progress,
            "note" => ContentType::Note,
            "research" => ContentType::Research,
            "project" => ContentType::Project,
            "decision" => ContentType::Decision,
            "hub" => ContentType::Hub,
            _ => ContentType::Other,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_decision_from_path() {
        assert_eq!(
            ContentType::infer_from_path("notes/decision-sqlite.md"),
            ContentType::Decision
        );
    }

    #[test]
    fn infers_handoff_before_note() {
        // "handoffs/..." contains neither "note" nor "project"; regression
        // guard for keyword precedence order.
        assert_eq!(
            ContentType::infer_from_path("handoffs/2024-05-01.md"),
            ContentType::Handoff
        );
    }

    #[test]
    fn unrecognized_path_is_other() {
        assert_eq!(ContentType::infer_from_path("notes/random.md"), ContentType::Other);
    }
}
