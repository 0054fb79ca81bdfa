use crate::error::{check_aligned, MetricError};
use crate::tokenize::rouge_tokens;
use crate::{Metric, ScoreColumns};
use async_trait::async_trait;

pub const PRECISION_COLUMN: &str = "rougeL_precision";
pub const RECALL_COLUMN: &str = "rougeL_recall";

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RougeScore {
    pub precision: f64,
    pub recall: f64,
    pub fmeasure: f64,
}

/// Longest-common-subsequence ROUGE.
pub struct RougeL;

/// Length of the longest common subsequence.
pub fn lcs_len(a: &[String], b: &[String]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut cur = vec![0usize; b.len() + 1];
    for x in a {
        for (j, y) in b.iter().enumerate() {
            cur[j + 1] = if x == y {
                prev[j] + 1
            } else {
                prev[j + 1].max(cur[j])
            };
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

pub fn rouge_l(reference: &str, candidate: &str) -> RougeScore {
    let r = rouge_tokens(reference);
    let c = rouge_tokens(candidate);
    if r.is_empty() || c.is_empty() {
        return RougeScore::default();
    }
    let lcs = lcs_len(&r, &c) as f64;
    let precision = lcs / c.len() as f64;
    let recall = lcs / r.len() as f64;
    let fmeasure = if precision + recall > 0.0 {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    RougeScore {
        precision,
        recall,
        fmeasure,
    }
}

/// Best score over several references by F-measure; the first wins ties.
pub fn rouge_l_multi(references: &[String], candidate: &str) -> RougeScore {
    let mut best: Option<RougeScore> = None;
    for r in references {
        let s = rouge_l(r, candidate);
        if best.map_or(true, |b| s.fmeasure > b.fmeasure) {
            best = Some(s);
        }
    }
    best.unwrap_or_default()
}

#[async_trait]
impl Metric for RougeL {
    fn name(&self) -> &'static str {
        "rougeL"
    }

    async fn score_many(
        &self,
        references: &[Vec<String>],
        candidates: &[String],
    ) -> Result<ScoreColumns, MetricError> {
        check_aligned(self.name(), references, candidates)?;
        let (mut p, mut r) = (Vec::new(), Vec::new());
        for (refs, cand) in references.iter().zip(candidates) {
            let s = rouge_l_multi(refs, cand);
            p.push(s.precision);
            r.push(s.recall);
        }
        Ok(ScoreColumns::from([
            (PRECISION_COLUMN.to_string(), p),
            (RECALL_COLUMN.to_string(), r),
        ]))
    }
}
