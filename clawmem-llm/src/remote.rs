//! Remote HTTP backend implementing the OpenAI-compatible contracts of §6.

use clawmem_core::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
struct EmbedRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponseItem {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedResponseItem>,
}

/// `POST {embed_url}/v1/embeddings`.
pub async fn embed(
    client: &reqwest::Client,
    base_url: &str,
    model: &str,
    inputs: &[String],
) -> Result<Vec<Vec<f32>>> {
    let resp: EmbedResponse = post_json(client, &format!("{base_url}/v1/embeddings"), &EmbedRequest { input: inputs, model })
        .await?;
    let mut out = vec![Vec::new(); inputs.len()];
    for item in resp.data {
        if let Some(slot) = out.get_mut(item.index) {
            *slot = item.embedding;
        }
    }
    Ok(out)
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionChoiceMessage,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

/// `POST {llm_url}/v1/chat/completions`.
pub async fn generate(
    client: &reqwest::Client,
    base_url: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String> {
    let request = ChatCompletionRequest {
        model,
        messages: vec![ChatMessage { role: "user", content: prompt }],
        max_tokens,
        temperature,
    };
    let resp: ChatCompletionResponse =
        post_json(client, &format!("{base_url}/v1/chat/completions"), &request).await?;
    resp.choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| Error::RemoteUnavailable {
            reason: "empty choices array in chat completion response".to_string(),
        })
}

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    documents: &'a [String],
}

#[derive(Deserialize)]
struct RerankResultItem {
    index: usize,
    relevance_score: f64,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankResultItem>,
}

/// `POST {rerank_url}/v1/rerank`.
pub async fn rerank(
    client: &reqwest::Client,
    base_url: &str,
    query: &str,
    documents: &[String],
) -> Result<Vec<(usize, f64)>> {
    let resp: RerankResponse =
        post_json(client, &format!("{base_url}/v1/rerank"), &RerankRequest { query, documents }).await?;
    Ok(resp.results.into_iter().map(|r| (r.index, r.relevance_score)).collect())
}

async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
    client: &reqwest::Client,
    url: &str,
    body: &Req,
) -> Result<Resp> {
    let response = client
        .post(url)
        .json(body)
        .send()
        .await
        .map_err(|e| Error::RemoteUnavailable { reason: e.to_string() })?;

    if !response.status().is_success() {
        return Err(Error::RemoteUnavailable {
            reason: format!("{url} returned status {}", response.status()),
        });
    }

    response
        .json::<Resp>()
        .await
        .map_err(|e| Error::RemoteUnavailable { reason: format!("malformed response from {url}: {e}") })
}
