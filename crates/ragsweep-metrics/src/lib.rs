use async_trait::async_trait;
use indexmap::IndexMap;
use ragsweep_core::config::ScoringConfig;
use std::sync::Arc;

pub mod bertscore;
pub mod bleu;
pub mod embedder;
pub mod error;
pub mod reference;
pub mod rouge;
pub mod score;
pub mod tokenize;

pub use error::MetricError;

/// Named metric column to one value per input row, in the order metrics
/// produced them.
pub type ScoreColumns = IndexMap<String, Vec<f64>>;

/// Scores aligned (references, candidate) rows.
#[async_trait]
pub trait Metric: Send + Sync {
    fn name(&self) -> &'static str;

    async fn score_many(
        &self,
        references: &[Vec<String>],
        candidates: &[String],
    ) -> Result<ScoreColumns, MetricError>;
}

/// ROUGE-L, BLEU and BERTScore, in that order.
pub fn default_metrics(
    cfg: &ScoringConfig,
    embedder: Arc<dyn embedder::TokenEmbedder>,
) -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(rouge::RougeL),
        Arc::new(bleu::Bleu::new(cfg.bleu_tokenizer)),
        Arc::new(bertscore::BertScoreMetric::new(embedder, &cfg.bert_score)),
    ]
}
