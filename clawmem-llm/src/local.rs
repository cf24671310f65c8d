//! In-process local fallback backend (§4.2 "on remote absence, falls back
//! to a local in-process model"). No real model weights are bundled here;
//! the fallback is a deterministic, dependency-free approximation so the
//! gateway degrades to *something* usable rather than failing outright when
//! no remote backend is configured.

use std::sync::atomic::{AtomicBool, Ordering};

use clawmem_core::constants::LOCAL_EMBED_DIM;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

/// Marker for "the local model is resident". Loading is simulated — there
/// is nothing to actually load — but the guard still serializes concurrent
/// first-use the same way a real lazy model load would (§4.2: "guarded
/// against concurrent double-loads by a shared in-flight promise/future").
pub struct LocalBackend {
    loaded: Mutex<()>,
    resident: AtomicBool,
}

impl LocalBackend {
    #[must_use]
    pub fn new() -> Self {
        LocalBackend {
            loaded: Mutex::new(()),
            resident: AtomicBool::new(false),
        }
    }

    async fn ensure_loaded(&self) {
        if self.resident.load(Ordering::Acquire) {
            return;
        }
        let _guard = self.loaded.lock().await;
        if !self.resident.load(Ordering::Acquire) {
            self.resident.store(true, Ordering::Release);
        }
    }

    /// Drop residency; idempotent (§4.2 `dispose()`).
    pub fn unload(&self) {
        self.resident.store(false, Ordering::Release);
    }

    #[must_use]
    pub fn is_resident(&self) -> bool {
        self.resident.load(Ordering::Acquire)
    }

    /// A deterministic pseudo-embedding: hash the text into a seed stream
    /// and fill a unit-normalized vector of [`LOCAL_EMBED_DIM`] floats.
    /// Captures no real semantics, but is stable, dimension-correct, and
    /// exercises the whole pipeline without a network dependency.
    pub async fn embed(&self, text: &str) -> Vec<f32> {
        self.ensure_loaded().await;
        pseudo_embedding(text)
    }

    /// Template completion: echoes a short deterministic continuation. Real
    /// generation always prefers the remote backend; this only runs when no
    /// remote URL is configured or the remote call failed.
    pub async fn generate(&self, prompt: &str) -> String {
        self.ensure_loaded().await;
        format!("[local-fallback] unable to reach a configured model for: {}", first_line(prompt))
    }

    /// Lexical-overlap reranking (Jaccard over lowercased word sets), used
    /// only when no remote reranker is reachable.
    pub async fn rerank(&self, query: &str, docs: &[(String, String)]) -> Vec<(String, f64)> {
        self.ensure_loaded().await;
        let query_tokens = tokenize(query);
        docs.iter()
            .map(|(id, text)| (id.clone(), jaccard(&query_tokens, &tokenize(text))))
            .collect()
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn pseudo_embedding(text: &str) -> Vec<f32> {
    let mut out = Vec::with_capacity(LOCAL_EMBED_DIM);
    let mut counter: u32 = 0;
    while out.len() < LOCAL_EMBED_DIM {
        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        hasher.update(counter.to_le_bytes());
        let digest = hasher.finalize();
        for chunk in digest.chunks_exact(4) {
            if out.len() >= LOCAL_EMBED_DIM {
                break;
            }
            let bits = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
            out.push((bits as f64 / f64::from(u32::MAX)).mul_add(2.0, -1.0) as f32);
        }
        counter += 1;
    }
    let norm = out.iter().map(|v| f64::from(*v) * f64::from(*v)).sum::<f64>().sqrt();
    if norm > 0.0 {
        for v in &mut out {
            *v = (f64::from(*v) / norm) as f32;
        }
    }
    out
}

fn tokenize(s: &str) -> std::collections::HashSet<String> {
    s.to_ascii_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &std::collections::HashSet<String>, b: &std::collections::HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn embed_is_deterministic_and_right_dimension() {
        let backend = LocalBackend::new();
        let a = backend.embed("hello world").await;
        let b = backend.embed("hello world").await;
        assert_eq!(a.len(), LOCAL_EMBED_DIM);
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn embed_differs_for_different_text() {
        let backend = LocalBackend::new();
        let a = backend.embed("alpha").await;
        let b = backend.embed("beta").await;
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn ensure_loaded_sets_resident() {
        let backend = LocalBackend::new();
        assert!(!backend.is_resident());
        backend.embed("x").await;
        assert!(backend.is_resident());
        backend.unload();
        assert!(!backend.is_resident());
    }

    #[tokio::test]
    async fn rerank_scores_exact_overlap_higher() {
        let backend = LocalBackend::new();
        let docs = vec![
            ("a".to_string(), "rust sqlite vector search".to_string()),
            ("b".to_string(), "completely unrelated text".to_string()),
        ];
        let scores = backend.rerank("rust vector search", &docs).await;
        let a_score = scores.iter().find(|(id, _)| id == "a").unwrap().1;
        let b_score = scores.iter().find(|(id, _)| id == "b").unwrap().1;
        assert!(a_score > b_score);
    }
}
