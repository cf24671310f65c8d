//! The entities of §3, modeled as plain data with stable integer/UUID ids and
//! side tables rather than owning references — the graph of documents, edges,
//! and evolution records is cyclic, so no entity here ever holds another by
//! value (§9 "cyclic/tangled graph references").

mod content;
mod graph;
mod intent;
mod session;

pub use content::{Content, ContentType, Document};
pub use graph::{Evolution, RelationEdge, RelationType};
pub use intent::{Intent, IntentClassification};
pub use session::{HookDedupeRecord, Session, UsageRecord};

/// A document fragment embedding (§3 "Embedding").
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Embedding {
    /// Content hash the embedding was computed from.
    pub hash: String,
    /// Fragment sequence number; `0` is always the whole-document fragment.
    pub seq: u32,
    /// Character offset of the fragment start within the body.
    pub pos: usize,
    pub model: String,
    pub embedded_at: chrono::DateTime<chrono::Utc>,
    pub fragment_type: FragmentType,
    pub fragment_label: Option<String>,
    pub vector: Vec<f32>,
}

/// Tagged variant for fragment provenance (§9 "polymorphic Result objects" —
/// modeled as an enum, never inheritance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentType {
    Full,
    Section,
    List,
    Code,
    Frontmatter,
    Fact,
    Narrative,
}

impl FragmentType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FragmentType::Full => "full",
            FragmentType::Section => "section",
            FragmentType::List => "list",
            FragmentType::Code => "code",
            FragmentType::Frontmatter => "frontmatter",
            FragmentType::Fact => "fact",
            FragmentType::Narrative => "narrative",
        }
    }
}

/// Tagged variant for which retrieval channel produced a hit (§9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Fts,
    Vec,
}
