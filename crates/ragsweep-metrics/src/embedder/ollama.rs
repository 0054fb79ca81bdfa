use super::TokenEmbedder;
use async_trait::async_trait;
use ragsweep_core::errors::ProviderError;
use ragsweep_core::providers::http::HttpTransport;
use serde_json::json;
use std::collections::HashMap;

/// Inputs per `/api/embed` request.
pub const DEFAULT_BATCH_SIZE: usize = 256;

/// Embeds tokens through a local embedding model (`POST /api/embed`).
/// Each distinct token is sent once per call.
pub struct OllamaTokenEmbedder {
    pub base_url: String,
    pub model: String,
    batch_size: usize,
    transport: HttpTransport,
}

impl OllamaTokenEmbedder {
    pub fn new(base_url: &str, model: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            batch_size: DEFAULT_BATCH_SIZE,
            transport,
        }
    }

    /// At least one input per request.
    pub fn with_batch_size(mut self, n: usize) -> Self {
        self.batch_size = n.max(1);
        self
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, inputs: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        let url = format!("{}/api/embed", self.base_url);
        let body = json!({"model": self.model, "input": inputs});
        let resp = self.transport.post_json(&url, &body, None).await?;
        if !resp.is_success() {
            return Err(ProviderError::Status {
                provider: "ollama".into(),
                status: resp.status,
                body: resp.body_text(),
            }
            .into());
        }

        let malformed = |detail: &str| ProviderError::MalformedResponse {
            provider: "ollama".into(),
            detail: detail.into(),
        };
        let rows = resp
            .body
            .get("embeddings")
            .and_then(|v| v.as_array())
            .ok_or_else(|| malformed("missing embeddings"))?;
        if rows.len() != inputs.len() {
            return Err(malformed(&format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                rows.len()
            ))
            .into());
        }

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let vec = row
                .as_array()
                .ok_or_else(|| malformed("embedding is not an array"))?
                .iter()
                .map(|x| x.as_f64().map(|f| f as f32))
                .collect::<Option<Vec<f32>>>()
                .ok_or_else(|| malformed("embedding contains non-numeric value"))?;
            out.push(vec);
        }
        Ok(out)
    }
}

#[async_trait]
impl TokenEmbedder for OllamaTokenEmbedder {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn embed_tokens(&self, texts: &[Vec<String>]) -> anyhow::Result<Vec<Vec<Vec<f32>>>> {
        let mut distinct: Vec<&str> = Vec::new();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for tok in texts.iter().flatten() {
            if !seen.contains_key(tok.as_str()) {
                seen.insert(tok.as_str(), distinct.len());
                distinct.push(tok.as_str());
            }
        }

        let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(distinct.len());
        for chunk in distinct.chunks(self.batch_size) {
            tracing::debug!(model = %self.model, tokens = chunk.len(), "embedding batch");
            vectors.extend(self.embed_batch(chunk).await?);
        }

        let mut out = Vec::with_capacity(texts.len());
        for tokens in texts {
            let mut row = Vec::with_capacity(tokens.len());
            for t in tokens {
                let idx = seen
                    .get(t.as_str())
                    .copied()
                    .ok_or_else(|| anyhow::anyhow!("token '{}' was not embedded", t))?;
                row.push(vectors[idx].clone());
            }
            out.push(row);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    #[serial]
    async fn embeds_each_distinct_token_once() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(json!({"model": "nomic-embed-text", "input": ["paris", "is"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[1.0, 0.0], [0.0, 1.0]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let e = OllamaTokenEmbedder::new(&server.uri(), "nomic-embed-text", HttpTransport::default());
        let out = e
            .embed_tokens(&[
                vec!["paris".into(), "is".into()],
                vec!["is".into(), "paris".into()],
            ])
            .await
            .unwrap();

        assert_eq!(out[0], vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(out[1], vec![vec![0.0, 1.0], vec![1.0, 0.0]]);
    }

    #[tokio::test]
    #[serial]
    async fn short_response_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0]]})))
            .mount(&server)
            .await;

        let e = OllamaTokenEmbedder::new(&server.uri(), "m", HttpTransport::default());
        let err = e
            .embed_tokens(&[vec!["a".into(), "b".into()]])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("expected 2 embeddings"));
    }

    #[tokio::test]
    #[serial]
    async fn batches_respect_batch_size() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0]]})))
            .expect(3)
            .mount(&server)
            .await;

        let e = OllamaTokenEmbedder::new(&server.uri(), "m", HttpTransport::default())
            .with_batch_size(1);
        let out = e
            .embed_tokens(&[vec!["a".into(), "b".into(), "c".into(), "a".into()]])
            .await
            .unwrap();
        assert_eq!(out[0].len(), 4);
    }

    #[tokio::test]
    #[serial]
    async fn zero_batch_size_is_clamped() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embeddings": [[1.0]]})))
            .expect(2)
            .mount(&server)
            .await;

        let e = OllamaTokenEmbedder::new(&server.uri(), "m", HttpTransport::default())
            .with_batch_size(0);
        assert_eq!(e.batch_size(), 1);
        let out = e
            .embed_tokens(&[vec!["a".into(), "b".into()]])
            .await
            .unwrap();
        assert_eq!(out[0].len(), 2);
    }
}
