use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A directed edge in the multi-graph of documents (§3 "Relation edge").
/// Keyed by `(source_id, target_id, relation_type)`; traversal treats some
/// relation types as symmetric (see `clawmem-engine::traversal`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationEdge {
    pub source_id: i64,
    pub target_id: i64,
    pub relation_type: RelationType,
    pub weight: f64,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// The fixed set of relation types (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Temporal,
    Semantic,
    Causal,
    Supporting,
    Contradicts,
    Entity,
}

impl RelationType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Temporal => "temporal",
            RelationType::Semantic => "semantic",
            RelationType::Causal => "causal",
            RelationType::Supporting => "supporting",
            RelationType::Contradicts => "contradicts",
            RelationType::Entity => "entity",
        }
    }

    /// Relation types treated as symmetric by inbound traversal (§4.7: beam
    /// search enumerates outbound edges universally, inbound only for
    /// `semantic` and `entity`).
    #[must_use]
    pub fn is_traversal_symmetric(self) -> bool {
        matches!(self, RelationType::Semantic | RelationType::Entity)
    }
}

impl std::str::FromStr for RelationType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "temporal" => RelationType::Temporal,
            "semantic" => RelationType::Semantic,
            "causal" => RelationType::Causal,
            "supporting" => RelationType::Supporting,
            "contradicts" => RelationType::Contradicts,
            "entity" => RelationType::Entity,
            other => anyhow::bail!("unknown relation type: {other}"),
        })
    }
}

/// An append-only A-MEM evolution history row (§3 "Evolution record").
/// `version` is monotone per `memory_id`; never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evolution {
    pub memory_id: i64,
    pub triggered_by: i64,
    pub version: u32,
    pub previous_keywords: Vec<String>,
    pub previous_context: String,
    pub new_keywords: Vec<String>,
    pub new_context: String,
    pub reasoning: String,
    pub created_at: DateTime<Utc>,
}
