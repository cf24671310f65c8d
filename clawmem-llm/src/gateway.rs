use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use clawmem_core::constants::{DISPOSE_TIMEOUT_MS, GENERATE_DEFAULT_TIMEOUT_MS};
use clawmem_core::{Error, Result};
use parking_lot::Mutex;
use tracing::warn;

use crate::cache::{cache_key, ResultCache};
use crate::local::LocalBackend;
use crate::prompts::{embed_document_template, embed_query_template, expand_query_prompt, rerank_document};
use crate::remote;
use crate::repair::repair_json;

/// Formatting options for [`Gateway::embed`].
#[derive(Debug, Clone, Default)]
pub struct EmbedOptions {
    pub is_query: bool,
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmbedResult {
    pub vector: Vec<f32>,
    pub model: String,
}

/// Options for [`Gateway::generate`]. `cancel`, when set, is polled before
/// and after the remote call so callers can cooperatively abort in-flight
/// generation (§5 "cancellation signals must propagate").
#[derive(Clone, Default)]
pub struct GenerateOptions {
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_ms: Option<u64>,
    pub cancel: Option<std::sync::Arc<AtomicBool>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResult {
    pub text: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RerankHit {
    pub file: String,
    pub score: f64,
}

/// Which `expand_query` bucket a variant belongs to (§4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryVariantKind {
    Lex,
    Vec,
    Hyde,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExpandedQuery {
    #[serde(rename = "type")]
    pub kind: QueryVariantKind,
    pub text: String,
}

/// Configuration the gateway is constructed with; mirrors the relevant
/// subset of [`clawmem_core::config::RuntimeConfig`].
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    pub embed_url: Option<String>,
    pub llm_url: Option<String>,
    pub rerank_url: Option<String>,
    pub embed_model: String,
    pub llm_model: String,
    pub rerank_model: String,
    pub idle_unload_secs: u64,
}

/// The unified embedder/generator/reranker facade (§4.2, component C2).
pub struct Gateway {
    client: reqwest::Client,
    config: GatewayConfig,
    local: LocalBackend,
    expand_cache: ResultCache<Vec<ExpandedQuery>>,
    rerank_cache: ResultCache<Vec<RerankHit>>,
    last_used: Mutex<Instant>,
}

impl Gateway {
    #[must_use]
    pub fn new(config: GatewayConfig) -> Self {
        Gateway {
            client: reqwest::Client::new(),
            config,
            local: LocalBackend::new(),
            expand_cache: ResultCache::new(),
            rerank_cache: ResultCache::new(),
            last_used: Mutex::new(Instant::now()),
        }
    }

    fn touch(&self) {
        *self.last_used.lock() = Instant::now();
    }

    /// Whether the idle-unload timer (§4.2, default 2 min, 0 disables) has
    /// elapsed since the last call. The caller (typically a periodic task in
    /// the engine crate) is responsible for invoking [`Gateway::dispose`]
    /// when this returns `true`.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        if self.config.idle_unload_secs == 0 {
            return false;
        }
        self.last_used.lock().elapsed() >= Duration::from_secs(self.config.idle_unload_secs)
    }

    /// Dispose local resources. Idempotent; bounded by a hard timeout race
    /// so a stuck disposal can never hang the caller (§4.2).
    pub async fn dispose(&self) {
        let unload = async { self.local.unload() };
        if tokio::time::timeout(Duration::from_millis(DISPOSE_TIMEOUT_MS), unload)
            .await
            .is_err()
        {
            warn!("local backend disposal exceeded its timeout budget");
        }
    }

    /// Embed one piece of text (§4.2 operation 1).
    pub async fn embed(&self, text: &str, opts: &EmbedOptions) -> Result<EmbedResult> {
        self.touch();
        let formatted = if opts.is_query {
            embed_query_template(text)
        } else {
            embed_document_template(text, opts.title.as_deref())
        };

        if let Some(url) = self.config.embed_url.as_deref() {
            match remote::embed(&self.client, url, &self.config.embed_model, std::slice::from_ref(&formatted)).await
            {
                Ok(mut vectors) if !vectors.is_empty() => {
                    return Ok(EmbedResult { vector: vectors.remove(0), model: self.config.embed_model.clone() });
                }
                Ok(_) | Err(_) => {
                    warn!(url, "remote embedder unavailable, falling back to local backend");
                }
            }
        }

        let vector = self.local.embed(&formatted).await;
        Ok(EmbedResult { vector, model: "local-fallback".to_string() })
    }

    /// Embed a batch of documents in one remote call where possible.
    pub async fn embed_batch(&self, texts: &[String], opts: &EmbedOptions) -> Result<Vec<EmbedResult>> {
        self.touch();
        let formatted: Vec<String> = texts
            .iter()
            .map(|t| {
                if opts.is_query {
                    embed_query_template(t)
                } else {
                    embed_document_template(t, opts.title.as_deref())
                }
            })
            .collect();

        if let Some(url) = self.config.embed_url.as_deref() {
            match remote::embed(&self.client, url, &self.config.embed_model, &formatted).await {
                Ok(vectors) => {
                    return Ok(vectors
                        .into_iter()
                        .map(|vector| EmbedResult { vector, model: self.config.embed_model.clone() })
                        .collect());
                }
                Err(_) => warn!(url, "remote embedder unavailable, falling back to local backend"),
            }
        }

        let mut out = Vec::with_capacity(formatted.len());
        for text in &formatted {
            out.push(EmbedResult { vector: self.local.embed(text).await, model: "local-fallback".to_string() });
        }
        Ok(out)
    }

    /// Generate text from a prompt (§4.2 operation 2). Remote-first, honors
    /// a cooperative cancel flag and a hard timeout.
    pub async fn generate(&self, prompt: &str, opts: &GenerateOptions) -> Result<GenerateResult> {
        self.touch();
        if is_cancelled(&opts.cancel) {
            return Err(Error::RemoteUnavailable { reason: "generation cancelled before dispatch".to_string() });
        }

        let timeout = Duration::from_millis(opts.timeout_ms.unwrap_or(GENERATE_DEFAULT_TIMEOUT_MS));

        if let Some(url) = self.config.llm_url.as_deref() {
            let call = remote::generate(&self.client, url, &self.config.llm_model, prompt, opts.max_tokens, opts.temperature);
            match tokio::time::timeout(timeout, call).await {
                Ok(Ok(text)) => return Ok(GenerateResult { text, model: self.config.llm_model.clone() }),
                Ok(Err(_)) | Err(_) => warn!(url, "remote generator unavailable or timed out, falling back"),
            }
        }

        if is_cancelled(&opts.cancel) {
            return Err(Error::RemoteUnavailable { reason: "generation cancelled before local fallback".to_string() });
        }
        let text = self.local.generate(prompt).await;
        Ok(GenerateResult { text, model: "local-fallback".to_string() })
    }

    /// Rerank candidate documents against a query (§4.2 operation 3),
    /// sorted descending by score.
    pub async fn rerank(&self, query: &str, docs: &[(String, String)]) -> Result<Vec<RerankHit>> {
        self.touch();
        let ids_key = docs.iter().map(|(id, _)| id.as_str()).collect::<Vec<_>>().join(",");
        let key = cache_key("rerank", query, &ids_key);
        if let Some(cached) = self.rerank_cache.get(&key) {
            return Ok(cached);
        }

        let mut hits = if let Some(url) = self.config.rerank_url.as_deref() {
            let truncated: Vec<String> = docs.iter().map(|(_, text)| rerank_document(text)).collect();
            match remote::rerank(&self.client, url, query, &truncated).await {
                Ok(scores) => scores
                    .into_iter()
                    .filter_map(|(idx, score)| docs.get(idx).map(|(id, _)| RerankHit { file: id.clone(), score }))
                    .collect(),
                Err(_) => self.local_rerank(query, docs).await,
            }
        } else {
            self.local_rerank(query, docs).await
        };

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        self.rerank_cache.put(key, hits.clone());
        Ok(hits)
    }

    async fn local_rerank(&self, query: &str, docs: &[(String, String)]) -> Vec<RerankHit> {
        self.local
            .rerank(query, docs)
            .await
            .into_iter()
            .map(|(file, score)| RerankHit { file, score })
            .collect()
    }

    /// Generate 2-7 query variants tagged `lex`/`vec`/`hyde` (§4.2 operation
    /// 4). Remote output is parsed as line-prefixed text; local output uses
    /// the repair parser defensively in case the model emits JSON instead.
    pub async fn expand_query(
        &self,
        query: &str,
        include_lexical: bool,
        context: Option<&str>,
    ) -> Result<Vec<ExpandedQuery>> {
        self.touch();
        let model_key = self.config.llm_url.as_deref().unwrap_or("local-fallback");
        let key = cache_key("expand_query", query, model_key);
        if let Some(cached) = self.expand_cache.get(&key) {
            return Ok(cached);
        }

        let prompt = expand_query_prompt(query, include_lexical, context);
        let raw = self
            .generate(&prompt, &GenerateOptions { max_tokens: 256, temperature: 0.3, ..GenerateOptions::default() })
            .await?
            .text;

        let variants = parse_expand_query_output(&raw);
        self.expand_cache.put(key, variants.clone());
        Ok(variants)
    }
}

fn is_cancelled(flag: &Option<std::sync::Arc<AtomicBool>>) -> bool {
    flag.as_ref().is_some_and(|f| f.load(Ordering::SeqCst))
}

/// Parse line-prefixed `lex:`/`vec:`/`hyde:` output; falls back to the
/// repair parser if the model ignored the format and emitted JSON instead.
fn parse_expand_query_output(raw: &str) -> Vec<ExpandedQuery> {
    let mut out = Vec::new();
    for line in raw.lines() {
        let trimmed = line.trim();
        let (kind, rest) = if let Some(r) = trimmed.strip_prefix("lex:") {
            (QueryVariantKind::Lex, r)
        } else if let Some(r) = trimmed.strip_prefix("vec:") {
            (QueryVariantKind::Vec, r)
        } else if let Some(r) = trimmed.strip_prefix("hyde:") {
            (QueryVariantKind::Hyde, r)
        } else {
            continue;
        };
        let text = rest.trim();
        if !text.is_empty() {
            out.push(ExpandedQuery { kind, text: text.to_string() });
        }
    }

    if out.is_empty() {
        if let Some(value) = repair_json(raw) {
            if let Ok(parsed) = serde_json::from_value::<Vec<ExpandedQuery>>(value) {
                return parsed;
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_only_gateway() -> Gateway {
        Gateway::new(GatewayConfig {
            embed_model: "local".to_string(),
            llm_model: "local".to_string(),
            rerank_model: "local".to_string(),
            ..GatewayConfig::default()
        })
    }

    #[tokio::test]
    async fn embed_falls_back_to_local_without_configured_url() {
        let gateway = local_only_gateway();
        let result = gateway.embed("hello", &EmbedOptions::default()).await.unwrap();
        assert_eq!(result.model, "local-fallback");
        assert!(!result.vector.is_empty());
    }

    #[tokio::test]
    async fn generate_falls_back_to_local_without_configured_url() {
        let gateway = local_only_gateway();
        let result = gateway
            .generate("explain the vector index quirk", &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(result.model, "local-fallback");
    }

    #[tokio::test]
    async fn generate_respects_pre_set_cancel_flag() {
        let gateway = local_only_gateway();
        let cancel = std::sync::Arc::new(AtomicBool::new(true));
        let result = gateway
            .generate("anything", &GenerateOptions { cancel: Some(cancel), ..GenerateOptions::default() })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn rerank_sorts_descending_and_caches() {
        let gateway = local_only_gateway();
        let docs = vec![
            ("a".to_string(), "rust sqlite vector".to_string()),
            ("b".to_string(), "unrelated".to_string()),
        ];
        let hits = gateway.rerank("rust vector", &docs).await.unwrap();
        assert_eq!(hits[0].file, "a");
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn parses_line_prefixed_expand_output() {
        let raw = "vec: how do I configure the vector index\nlex: vector index config\nhyde: the vector index is configured via...";
        let variants = parse_expand_query_output(raw);
        assert_eq!(variants.len(), 3);
        assert_eq!(variants[0].kind, QueryVariantKind::Vec);
    }

    #[test]
    fn ignores_unprefixed_lines() {
        let raw = "Sure, here are some variants:\nvec: a rewrite\nThanks!";
        let variants = parse_expand_query_output(raw);
        assert_eq!(variants.len(), 1);
    }
}
