//! Token embedders for BERTScore.

pub mod hash;
pub mod ollama;

use async_trait::async_trait;
use ragsweep_core::config::{BertScoreConfig, EmbedderKind};
use ragsweep_core::providers::http::HttpTransport;
use std::sync::Arc;

pub use hash::HashTokenEmbedder;
pub use ollama::OllamaTokenEmbedder;

/// Maps tokenized texts to one vector per token.
#[async_trait]
pub trait TokenEmbedder: Send + Sync {
    fn name(&self) -> &'static str;

    /// Output is aligned with `texts`, and each inner list with its tokens.
    async fn embed_tokens(&self, texts: &[Vec<String>]) -> anyhow::Result<Vec<Vec<Vec<f32>>>>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

pub fn build_embedder(
    cfg: &BertScoreConfig,
    ollama_url: &str,
    transport: HttpTransport,
) -> Arc<dyn TokenEmbedder> {
    match cfg.embedder {
        EmbedderKind::Hash => Arc::new(HashTokenEmbedder::default()),
        EmbedderKind::Ollama => Arc::new(OllamaTokenEmbedder::new(
            ollama_url,
            cfg.model.clone(),
            transport,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_basics() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-12);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-12);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
