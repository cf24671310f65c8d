//! Fusion, recency/confidence, and composite scoring (§4.8, component C8).
//! Every formula here is required to be NaN/Infinity-safe: non-finite inputs
//! are substituted with a safe default rather than propagating `NaN`.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use clawmem_core::constants::{
    DEFAULT_COMPOSITE_WEIGHTS, RECENCY_INTENT_COMPOSITE_WEIGHTS, RRF_K, RRF_RANK0_BONUS, RRF_RANK12_BONUS,
};
use clawmem_core::types::ContentType;
use clawmem_core::{Error, Result};

/// Reciprocal rank fusion over `lists`, each paired with a weight in
/// `weights` at the same index (§4.8). `weights.len()` must equal
/// `lists.len()`; a mismatch is rejected rather than silently truncated.
pub fn reciprocal_rank_fusion(weights: &[f64], lists: &[Vec<String>]) -> Result<Vec<(String, f64)>> {
    reciprocal_rank_fusion_with_k(weights, lists, RRF_K)
}

/// As [`reciprocal_rank_fusion`], with an explicit `k` (non-finite values
/// coerce to [`RRF_K`]) — split out so the coercion rule is independently
/// testable.
pub fn reciprocal_rank_fusion_with_k(weights: &[f64], lists: &[Vec<String>], k: f64) -> Result<Vec<(String, f64)>> {
    if weights.len() != lists.len() {
        return Err(Error::LengthMismatch(format!(
            "{} weights for {} lists",
            weights.len(),
            lists.len()
        )));
    }
    let k = if k.is_finite() { k } else { RRF_K };

    let mut scores: HashMap<String, f64> = HashMap::new();
    for (raw_weight, list) in weights.iter().zip(lists) {
        let weight = normalize_weight(*raw_weight);
        if weight == 0.0 {
            continue;
        }
        for (rank, doc_id) in list.iter().enumerate() {
            let mut contribution = weight / (k + rank as f64 + 1.0);
            if rank == 0 {
                contribution += RRF_RANK0_BONUS;
            } else if rank == 1 || rank == 2 {
                contribution += RRF_RANK12_BONUS;
            }
            *scores.entry(doc_id.clone()).or_insert(0.0) += contribution;
        }
    }

    let mut fused: Vec<(String, f64)> = scores.into_iter().collect();
    fused.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    Ok(fused)
}

/// NaN/negative weights coerce to 1; an exact zero weight skips its list.
fn normalize_weight(weight: f64) -> f64 {
    if weight == 0.0 {
        0.0
    } else if !weight.is_finite() || weight < 0.0 {
        1.0
    } else {
        weight
    }
}

/// Content-type half-life in days; `None` means recency never decays
/// (§4.8's `∞` column).
#[must_use]
pub fn content_type_half_life_days(content_type: ContentType) -> Option<f64> {
    match content_type {
        ContentType::Handoff => Some(30.0),
        ContentType::Progress => Some(45.0),
        ContentType::Note | ContentType::Other => Some(60.0),
        ContentType::Research => Some(90.0),
        ContentType::Project => Some(120.0),
        ContentType::Decision | ContentType::Hub => None,
    }
}

/// Content-type confidence baseline (§4.8).
#[must_use]
pub fn content_type_confidence_baseline(content_type: ContentType) -> f64 {
    match content_type {
        ContentType::Handoff => 0.60,
        ContentType::Progress | ContentType::Note | ContentType::Other => 0.50,
        ContentType::Research => 0.70,
        ContentType::Project => 0.65,
        ContentType::Decision => 0.85,
        ContentType::Hub => 0.80,
    }
}

/// `2^(-days_since_modified / half_life)`; `1.0` for a future or zero-age
/// timestamp, `1.0` for an infinite half-life, `0.5` if the computation
/// yields a non-finite result (§4.8).
#[must_use]
pub fn recency_score(modified_at: DateTime<Utc>, now: DateTime<Utc>, content_type: ContentType) -> f64 {
    let Some(half_life) = content_type_half_life_days(content_type) else {
        return 1.0;
    };
    let days = (now - modified_at).num_seconds() as f64 / 86_400.0;
    if !days.is_finite() {
        return 0.5;
    }
    if days <= 0.0 {
        return 1.0;
    }
    let score = 2f64.powf(-days / half_life);
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.5
    }
}

/// `min(1, baseline · recency · (1 + log2(1 + access_count) · 0.1))`,
/// clamped and NaN-safe (§4.8).
#[must_use]
pub fn confidence_score(content_type: ContentType, recency: f64, access_count: u64) -> f64 {
    let baseline = content_type_confidence_baseline(content_type);
    let boost = 1.0 + (1.0 + access_count as f64).log2() * 0.1;
    let raw = baseline * recency * boost;
    if raw.is_finite() {
        raw.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Fixed set of recency-intent query patterns (§4.8) that switch composite
/// weighting toward recency over raw search score.
const RECENCY_INTENT_PATTERNS: &[&str] =
    &["recent", "recently", "last session", "last week", "where was i", "yesterday"];

#[must_use]
pub fn matches_recency_intent(query: &str) -> bool {
    let lower = query.to_ascii_lowercase();
    RECENCY_INTENT_PATTERNS.iter().any(|pattern| lower.contains(pattern))
}

/// The `(search, recency, confidence)` weight triple to use for a query
/// (§4.8): default unless the query matches a recency-intent pattern.
#[must_use]
pub fn composite_weights_for(query: &str) -> (f64, f64, f64) {
    if matches_recency_intent(query) {
        RECENCY_INTENT_COMPOSITE_WEIGHTS
    } else {
        DEFAULT_COMPOSITE_WEIGHTS
    }
}

/// `w_s·search + w_r·recency + w_c·confidence`, NaN/Infinity-safe.
#[must_use]
pub fn composite_score(search: f64, recency: f64, confidence: f64, weights: (f64, f64, f64)) -> f64 {
    let safe = |x: f64| if x.is_finite() { x } else { 0.0 };
    let (ws, wr, wc) = weights;
    let score = safe(ws) * safe(search) + safe(wr) * safe(recency) + safe(wc) * safe(confidence);
    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Whether a content type should float to the top within an equal composite
/// band once recency-intent weighting is active (§4.8).
#[must_use]
pub fn floats_under_recency_intent(content_type: ContentType) -> bool {
    matches!(content_type, ContentType::Handoff | ContentType::Decision | ContentType::Progress)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rrf_rejects_length_mismatch() {
        let result = reciprocal_rank_fusion(&[1.0], &[vec!["a".to_string()], vec!["b".to_string()]]);
        assert!(result.is_err());
    }

    #[test]
    fn rrf_gives_rank0_bonus() {
        let fused = reciprocal_rank_fusion(&[1.0], &[vec!["a".to_string(), "b".to_string()]]).unwrap();
        let a = fused.iter().find(|(id, _)| id == "a").unwrap().1;
        let b = fused.iter().find(|(id, _)| id == "b").unwrap().1;
        assert!(a > b);
    }

    #[test]
    fn rrf_skips_zero_weight_lists() {
        let fused = reciprocal_rank_fusion(&[0.0, 1.0], &[vec!["a".to_string()], vec!["b".to_string()]]).unwrap();
        assert!(fused.iter().all(|(id, _)| id != "a"));
    }

    #[test]
    fn rrf_coerces_nan_weight_to_one() {
        let with_nan = reciprocal_rank_fusion(&[f64::NAN], &[vec!["a".to_string()]]).unwrap();
        let with_one = reciprocal_rank_fusion(&[1.0], &[vec!["a".to_string()]]).unwrap();
        assert!((with_nan[0].1 - with_one[0].1).abs() < f64::EPSILON);
    }

    #[test]
    fn rrf_coerces_non_finite_k() {
        let fused = reciprocal_rank_fusion_with_k(&[1.0], &[vec!["a".to_string()]], f64::NAN).unwrap();
        let expected = reciprocal_rank_fusion_with_k(&[1.0], &[vec!["a".to_string()]], RRF_K).unwrap();
        assert!((fused[0].1 - expected[0].1).abs() < f64::EPSILON);
    }

    #[test]
    fn decision_has_infinite_half_life_so_recency_is_always_one() {
        let now = Utc::now();
        let old = now - chrono::Duration::days(10_000);
        assert_eq!(recency_score(old, now, ContentType::Decision), 1.0);
    }

    #[test]
    fn recency_decays_over_half_life() {
        let now = Utc::now();
        let one_half_life_ago = now - chrono::Duration::days(30);
        let score = recency_score(one_half_life_ago, now, ContentType::Handoff);
        assert!((score - 0.5).abs() < 0.01);
    }

    #[test]
    fn future_timestamp_is_full_recency() {
        let now = Utc::now();
        let future = now + chrono::Duration::days(5);
        assert_eq!(recency_score(future, now, ContentType::Note), 1.0);
    }

    #[test]
    fn confidence_is_clamped_to_one() {
        let score = confidence_score(ContentType::Decision, 1.0, 1_000_000);
        assert!(score <= 1.0);
    }

    #[test]
    fn recency_intent_pattern_switches_weights() {
        assert_eq!(composite_weights_for("what did I do recently"), RECENCY_INTENT_COMPOSITE_WEIGHTS);
        assert_eq!(composite_weights_for("explain the vector index"), DEFAULT_COMPOSITE_WEIGHTS);
    }

    #[test]
    fn composite_score_is_nan_safe() {
        let score = composite_score(f64::NAN, 0.5, 0.5, (0.5, 0.25, 0.25));
        assert!(score.is_finite());
    }

    #[test]
    fn handoff_decision_progress_float_under_recency_intent() {
        assert!(floats_under_recency_intent(ContentType::Handoff));
        assert!(floats_under_recency_intent(ContentType::Decision));
        assert!(floats_under_recency_intent(ContentType::Progress));
        assert!(!floats_under_recency_intent(ContentType::Note));
    }
}
