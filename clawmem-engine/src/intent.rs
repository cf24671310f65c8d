//! Intent classification (§4.6, component C6): an instant heuristic layer
//! that always runs, an LLM refinement path for low-confidence heuristic
//! results, and a SHA-256-keyed result cache with a 1-hour TTL.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use clawmem_core::constants::INTENT_REFINEMENT_CONFIDENCE_FLOOR;
use clawmem_core::types::{Intent, IntentClassification};
use clawmem_core::Result;
use clawmem_llm::{intent_classification_prompt, Gateway, GenerateOptions};
use clawmem_store::{hash_body, Store};
use regex::Regex;

/// Heuristic classification, before any LLM refinement.
#[derive(Debug, Clone, PartialEq)]
pub struct HeuristicResult {
    pub intent: Intent,
    pub confidence: f64,
    pub temporal_start: Option<DateTime<Utc>>,
    pub temporal_end: Option<DateTime<Utc>>,
}

/// Classify a query, consulting the cache first, then the heuristic layer,
/// then (only below [`INTENT_REFINEMENT_CONFIDENCE_FLOOR`]) an LLM
/// refinement call constrained to a single token (§4.6).
pub async fn classify(store: &Store, gateway: &Gateway, query: &str) -> Result<IntentClassification> {
    if let Some(cached) = store.get_cached_intent(query).await? {
        return Ok(cached);
    }

    let heuristic = classify_heuristic(query);
    let (intent, confidence) = if heuristic.confidence < INTENT_REFINEMENT_CONFIDENCE_FLOOR {
        match refine_with_llm(gateway, query).await {
            Some(refined) => (refined, 0.9),
            None => (heuristic.intent, heuristic.confidence),
        }
    } else {
        (heuristic.intent, heuristic.confidence)
    };

    store
        .put_cached_intent(
            query,
            intent,
            confidence,
            heuristic.temporal_start.map(|t| t.timestamp()),
            heuristic.temporal_end.map(|t| t.timestamp()),
        )
        .await?;

    Ok(IntentClassification {
        query_hash: hash_body(query),
        query_text: query.to_string(),
        intent,
        confidence,
        temporal_start: heuristic.temporal_start,
        temporal_end: heuristic.temporal_end,
        cached_at: Utc::now(),
    })
}

async fn refine_with_llm(gateway: &Gateway, query: &str) -> Option<Intent> {
    let result = gateway
        .generate(&intent_classification_prompt(query), &GenerateOptions { max_tokens: 8, temperature: 0.0, ..GenerateOptions::default() })
        .await
        .ok()?;
    Intent::parse_strict(result.text.trim())
}

/// The always-on heuristic layer (§4.6). Pure and deterministic aside from
/// dating relative-time phrases off the current instant.
#[must_use]
pub fn classify_heuristic(query: &str) -> HeuristicResult {
    classify_heuristic_at(query, Utc::now())
}

fn classify_heuristic_at(query: &str, now: DateTime<Utc>) -> HeuristicResult {
    let lower = query.to_ascii_lowercase();

    let mut scores = [0.0f64; 4]; // why, when, entity, what
    const WHY: usize = 0;
    const WHEN: usize = 1;
    const ENTITY: usize = 2;
    const WHAT: usize = 3;

    for needle in ["why", "reason", "because", "caused", "cause of", "led to", "root cause"] {
        if lower.contains(needle) {
            scores[WHY] += 1.0;
        }
    }
    for needle in ["when", "what time", "what date", "yesterday", "last week", "last month", "ago", "schedule", "timeline"] {
        if lower.contains(needle) {
            scores[WHEN] += 1.0;
        }
    }
    for needle in ["who", "which one", "name of", "which file", "which module", "which person"] {
        if lower.contains(needle) {
            scores[ENTITY] += 1.0;
        }
    }
    for needle in ["what is", "what are", "what's", "how does", "how do", "explain", "describe"] {
        if lower.contains(needle) {
            scores[WHAT] += 1.0;
        }
    }

    match lower.split_whitespace().next() {
        Some("why") => scores[WHY] += 2.0,
        Some("when") => scores[WHEN] += 2.0,
        Some("who" | "which") => scores[ENTITY] += 2.0,
        Some("what" | "how") => scores[WHAT] += 1.0,
        _ => {}
    }

    let total: f64 = scores.iter().sum();
    let (temporal_start, temporal_end) = parse_temporal_range(&lower, now);

    // A resolved temporal phrase is strong evidence of a WHEN query; on a tie
    // for the top score it wins over whichever needle happened to sort last.
    let max_score = scores.iter().cloned().fold(f64::MIN, f64::max);
    let best_idx = if temporal_start.is_some() && (scores[WHEN] - max_score).abs() < f64::EPSILON {
        WHEN
    } else {
        scores
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(WHAT)
    };
    let best_score = scores[best_idx];

    let intent = match best_idx {
        WHY => Intent::Why,
        WHEN => Intent::When,
        ENTITY => Intent::Entity,
        _ => Intent::What,
    };

    let confidence = if total <= 0.0 { 0.3 } else { (best_score / total).clamp(0.0, 1.0) };

    HeuristicResult { intent, confidence, temporal_start, temporal_end }
}

fn day_bounds(at: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = at.date_naive().and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
    let end = at.date_naive().and_hms_opt(23, 59, 59).unwrap_or_default().and_utc();
    (start, end)
}

fn parse_temporal_range(lower: &str, now: DateTime<Utc>) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    if lower.contains("yesterday") {
        let (s, e) = day_bounds(now - Duration::days(1));
        return (Some(s), Some(e));
    }
    if lower.contains("today") {
        let (s, e) = day_bounds(now);
        return (Some(s), Some(e));
    }
    if lower.contains("last week") {
        return (Some(now - Duration::days(7)), Some(now));
    }
    if lower.contains("last month") {
        return (Some(now - Duration::days(30)), Some(now));
    }

    #[allow(clippy::unwrap_used)]
    let days_ago = Regex::new(r"(\d+)\s+days?\s+ago").unwrap();
    if let Some(caps) = days_ago.captures(lower) {
        if let Ok(n) = caps[1].parse::<i64>() {
            let (s, e) = day_bounds(now - Duration::days(n));
            return (Some(s), Some(e));
        }
    }

    if let Some((start, end)) = parse_named_month(lower) {
        return (Some(start), Some(end));
    }

    (None, None)
}

fn parse_named_month(lower: &str) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    #[allow(clippy::unwrap_used)]
    let re = Regex::new(
        r"\b(january|february|march|april|may|june|july|august|september|october|november|december)\s+(\d{4})\b",
    )
    .unwrap();
    let caps = re.captures(lower)?;
    let month = month_number(&caps[1])?;
    let year: i32 = caps[2].parse().ok()?;

    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let next_start = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    let end = next_start - Duration::seconds(1);
    Some((start, end))
}

fn month_number(name: &str) -> Option<u32> {
    Some(match name {
        "january" => 1,
        "february" => 2,
        "march" => 3,
        "april" => 4,
        "may" => 5,
        "june" => 6,
        "july" => 7,
        "august" => 8,
        "september" => 9,
        "october" => 10,
        "november" => 11,
        "december" => 12,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 28, 12, 0, 0).unwrap()
    }

    #[test]
    fn why_keyword_wins() {
        let result = classify_heuristic_at("why did the index rebuild fail", fixed_now());
        assert_eq!(result.intent, Intent::Why);
    }

    #[test]
    fn leading_when_wins_over_body_keywords() {
        let result = classify_heuristic_at("when did we decide on the causal edge format", fixed_now());
        assert_eq!(result.intent, Intent::When);
    }

    #[test]
    fn who_maps_to_entity() {
        let result = classify_heuristic_at("who wrote the vector search code", fixed_now());
        assert_eq!(result.intent, Intent::Entity);
    }

    #[test]
    fn generic_query_defaults_to_what_with_low_confidence() {
        let result = classify_heuristic_at("sqlite vector index", fixed_now());
        assert_eq!(result.intent, Intent::What);
        assert!(result.confidence < INTENT_REFINEMENT_CONFIDENCE_FLOOR);
    }

    #[test]
    fn yesterday_produces_a_one_day_range() {
        let result = classify_heuristic_at("what happened yesterday", fixed_now());
        let start = result.temporal_start.unwrap();
        let end = result.temporal_end.unwrap();
        assert_eq!(start.date_naive(), (fixed_now() - Duration::days(1)).date_naive());
        assert_eq!(end.date_naive(), start.date_naive());
    }

    #[test]
    fn days_ago_parses_the_count() {
        let result = classify_heuristic_at("what did I change 3 days ago", fixed_now());
        let start = result.temporal_start.unwrap();
        assert_eq!(start.date_naive(), (fixed_now() - Duration::days(3)).date_naive());
    }

    #[test]
    fn named_month_produces_a_month_range() {
        let result = classify_heuristic_at("what happened in january 2024", fixed_now());
        let start = result.temporal_start.unwrap();
        let end = result.temporal_end.unwrap();
        assert_eq!(start.month(), 1);
        assert_eq!(start.year(), 2024);
        assert_eq!(end.month(), 1);
    }

    #[test]
    fn temporal_tie_breaks_toward_when() {
        let result = classify_heuristic_at("what happened last week?", fixed_now());
        assert_eq!(result.intent, Intent::When);
    }

    #[test]
    fn no_temporal_phrase_is_none() {
        let result = classify_heuristic_at("what is the vector index", fixed_now());
        assert!(result.temporal_start.is_none());
    }
}
