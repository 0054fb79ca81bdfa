//! BERTScore-style greedy token matching over a pluggable embedder.

use crate::embedder::{cosine_similarity, TokenEmbedder};
use crate::error::{check_aligned, MetricError};
use crate::tokenize::embedding_tokens;
use crate::{Metric, ScoreColumns};
use async_trait::async_trait;
use ragsweep_core::config::{BaselineScores, BertScoreConfig};
use std::collections::HashMap;
use std::sync::Arc;

pub const PRECISION_COLUMN: &str = "bert_score_precision";
pub const RECALL_COLUMN: &str = "bert_score_recall";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BertScore {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl BertScore {
    fn rescaled(self, baseline: Option<&BaselineScores>) -> Self {
        let Some(b) = baseline else {
            return self;
        };
        let scale = |x: f64, base: f64| (x - base) / (1.0 - base);
        Self {
            precision: scale(self.precision, b.precision),
            recall: scale(self.recall, b.recall),
            f1: scale(self.f1, b.f1),
        }
    }
}

/// Greedy matching: each candidate token takes its most similar reference
/// token (precision) and vice versa (recall). Either side empty scores 0.
pub fn greedy_match(candidate: &[Vec<f32>], reference: &[Vec<f32>]) -> BertScore {
    if candidate.is_empty() || reference.is_empty() {
        return BertScore::default();
    }
    let sim: Vec<Vec<f64>> = candidate
        .iter()
        .map(|c| reference.iter().map(|r| cosine_similarity(c, r)).collect())
        .collect();

    let precision = sim
        .iter()
        .map(|row| row.iter().copied().fold(f64::NEG_INFINITY, f64::max))
        .sum::<f64>()
        / candidate.len() as f64;
    let recall = (0..reference.len())
        .map(|j| sim.iter().map(|row| row[j]).fold(f64::NEG_INFINITY, f64::max))
        .sum::<f64>()
        / reference.len() as f64;
    let f1 = if (precision + recall).abs() > f64::EPSILON {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    BertScore {
        precision,
        recall,
        f1,
    }
}

pub struct BertScoreMetric {
    embedder: Arc<dyn TokenEmbedder>,
    baseline: Option<BaselineScores>,
    lang: String,
}

impl BertScoreMetric {
    pub fn new(embedder: Arc<dyn TokenEmbedder>, cfg: &BertScoreConfig) -> Self {
        Self {
            embedder,
            baseline: cfg.baseline,
            lang: cfg.lang.clone(),
        }
    }
}

#[async_trait]
impl Metric for BertScoreMetric {
    fn name(&self) -> &'static str {
        "bert_score"
    }

    async fn score_many(
        &self,
        references: &[Vec<String>],
        candidates: &[String],
    ) -> Result<ScoreColumns, MetricError> {
        check_aligned(self.name(), references, candidates)?;

        // One embedding call for every distinct text in the run.
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut texts: Vec<&str> = Vec::new();
        for t in candidates
            .iter()
            .chain(references.iter().flatten())
            .map(String::as_str)
        {
            if !index.contains_key(t) {
                index.insert(t, texts.len());
                texts.push(t);
            }
        }
        let tokens: Vec<Vec<String>> = texts.iter().map(|t| embedding_tokens(t)).collect();

        tracing::info!(
            embedder = self.embedder.name(),
            lang = %self.lang,
            texts = texts.len(),
            rows = candidates.len(),
            "computing bert_score"
        );
        let embedded = self
            .embedder
            .embed_tokens(&tokens)
            .await
            .map_err(|e| MetricError::Embedding {
                embedder: self.embedder.name(),
                message: format!("{:#}", e),
            })?;
        if embedded.len() != texts.len() {
            return Err(MetricError::Embedding {
                embedder: self.embedder.name(),
                message: format!("expected {} texts, got {}", texts.len(), embedded.len()),
            });
        }
        check_dimensions(&embedded)?;

        let (mut p, mut r) = (Vec::new(), Vec::new());
        for (refs, cand) in references.iter().zip(candidates) {
            let c = &embedded[index[cand.as_str()]];
            let mut best: Option<BertScore> = None;
            for reference in refs {
                let s = greedy_match(c, &embedded[index[reference.as_str()]]);
                if best.map_or(true, |b| s.f1 > b.f1) {
                    best = Some(s);
                }
            }
            let s = best.unwrap_or_default().rescaled(self.baseline.as_ref());
            p.push(s.precision);
            r.push(s.recall);
        }

        Ok(ScoreColumns::from([
            (PRECISION_COLUMN.to_string(), p),
            (RECALL_COLUMN.to_string(), r),
        ]))
    }
}

fn check_dimensions(embedded: &[Vec<Vec<f32>>]) -> Result<(), MetricError> {
    let mut expected = None;
    for v in embedded.iter().flatten() {
        match expected {
            None => expected = Some(v.len()),
            Some(d) if d != v.len() => {
                return Err(MetricError::Dimension {
                    expected: d,
                    found: v.len(),
                })
            }
            Some(_) => {}
        }
    }
    Ok(())
}
