use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The query-intent classification used to route fusion weights and graph
/// traversal (§4.6, glossary "Intent").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    Why,
    When,
    Entity,
    What,
}

impl Intent {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Why => "WHY",
            Intent::When => "WHEN",
            Intent::Entity => "ENTITY",
            Intent::What => "WHAT",
        }
    }

    /// Parse the single capitalized token the LLM refinement path is
    /// constrained to emit (§4.6). Unknown tokens are rejected, not coerced,
    /// so the caller can fall through to the heuristic result.
    pub fn parse_strict(token: &str) -> Option<Self> {
        match token.trim() {
            "WHY" => Some(Intent::Why),
            "WHEN" => Some(Intent::When),
            "ENTITY" => Some(Intent::Entity),
            "WHAT" => Some(Intent::What),
            _ => None,
        }
    }

    /// Intent-to-weights table used both for fusion (§4.8) and traversal
    /// (§4.7), returned as `(causal, semantic, temporal, entity)`.
    #[must_use]
    pub fn relation_weights(self) -> RelationWeights {
        match self {
            Intent::Why => RelationWeights {
                causal: 5.0,
                semantic: 2.0,
                temporal: 0.5,
                entity: 1.0,
            },
            Intent::When => RelationWeights {
                causal: 1.0,
                semantic: 2.0,
                temporal: 5.0,
                entity: 0.5,
            },
            Intent::Entity => RelationWeights {
                causal: 2.0,
                semantic: 3.0,
                temporal: 1.0,
                entity: 6.0,
            },
            Intent::What => RelationWeights {
                causal: 1.0,
                semantic: 5.0,
                temporal: 1.0,
                entity: 2.0,
            },
        }
    }
}

/// Per-relation-type weight row of the intent-to-weights table (§4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelationWeights {
    pub causal: f64,
    pub semantic: f64,
    pub temporal: f64,
    pub entity: f64,
}

impl RelationWeights {
    #[must_use]
    pub fn for_relation(self, relation: crate::types::RelationType) -> f64 {
        use crate::types::RelationType as R;
        match relation {
            R::Causal => self.causal,
            R::Semantic | R::Supporting | R::Contradicts => self.semantic,
            R::Temporal => self.temporal,
            R::Entity => self.entity,
        }
    }
}

/// A cached intent classification (§3 "Intent classification"). Entries
/// older than the TTL (`constants::INTENT_CACHE_TTL_SECS`) are ignored by the
/// cache lookup, not eagerly swept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentClassification {
    pub query_hash: String,
    pub query_text: String,
    pub intent: Intent,
    pub confidence: f64,
    pub temporal_start: Option<DateTime<Utc>>,
    pub temporal_end: Option<DateTime<Utc>>,
    pub cached_at: DateTime<Utc>,
}

impl IntentClassification {
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        (now - self.cached_at).num_seconds() >= ttl_secs
    }
}
