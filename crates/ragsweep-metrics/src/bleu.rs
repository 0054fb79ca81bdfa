//! Sentence BLEU with NLTK's default (un-smoothed) behaviour.

use crate::error::{check_aligned, MetricError};
use crate::tokenize::{char_tokens, whitespace_tokens};
use crate::{Metric, ScoreColumns};
use async_trait::async_trait;
use ragsweep_core::config::BleuTokenizer;
use std::collections::HashMap;

pub const BLEU_COLUMN: &str = "bleu";
pub const MAX_ORDER: usize = 4;

pub struct Bleu {
    pub tokenizer: BleuTokenizer,
}

impl Bleu {
    pub fn new(tokenizer: BleuTokenizer) -> Self {
        Self { tokenizer }
    }

    fn tokens(&self, text: &str) -> Vec<String> {
        match self.tokenizer {
            BleuTokenizer::Words => whitespace_tokens(text),
            BleuTokenizer::Chars => char_tokens(text),
        }
    }
}

fn ngram_counts(tokens: &[String], n: usize) -> HashMap<&[String], usize> {
    let mut counts = HashMap::new();
    if tokens.len() >= n {
        for w in tokens.windows(n) {
            *counts.entry(w).or_insert(0) += 1;
        }
    }
    counts
}

/// Clipped n-gram matches and the candidate's n-gram total (at least 1).
fn modified_precision(references: &[Vec<String>], hypothesis: &[String], n: usize) -> (usize, usize) {
    let counts = ngram_counts(hypothesis, n);
    let ref_counts: Vec<_> = references.iter().map(|r| ngram_counts(r, n)).collect();

    let mut numerator = 0;
    for (gram, count) in &counts {
        let max_ref = ref_counts
            .iter()
            .map(|rc| rc.get(gram).copied().unwrap_or(0))
            .max()
            .unwrap_or(0);
        numerator += (*count).min(max_ref);
    }
    let denominator = counts.values().sum::<usize>().max(1);
    (numerator, denominator)
}

/// Reference length closest to the hypothesis; the shorter wins ties.
fn closest_ref_length(references: &[Vec<String>], hyp_len: usize) -> usize {
    references
        .iter()
        .map(Vec::len)
        .min_by_key(|&r| (r.abs_diff(hyp_len), r))
        .unwrap_or(0)
}

fn brevity_penalty(ref_len: usize, hyp_len: usize) -> f64 {
    if hyp_len > ref_len {
        1.0
    } else if hyp_len == 0 {
        0.0
    } else {
        (1.0 - ref_len as f64 / hyp_len as f64).exp()
    }
}

/// BLEU-4 with uniform weights. Zero unigram matches score 0; a zero count
/// at a higher order is replaced by the smallest positive float.
pub fn sentence_bleu(references: &[Vec<String>], hypothesis: &[String]) -> f64 {
    let mut precisions = Vec::with_capacity(MAX_ORDER);
    for n in 1..=MAX_ORDER {
        precisions.push(modified_precision(references, hypothesis, n));
    }
    if precisions[0].0 == 0 {
        return 0.0;
    }

    let bp = brevity_penalty(closest_ref_length(references, hypothesis.len()), hypothesis.len());
    let weight = 1.0 / MAX_ORDER as f64;
    let log_sum: f64 = precisions
        .iter()
        .map(|&(num, den)| {
            let p = if num == 0 {
                f64::MIN_POSITIVE
            } else {
                num as f64 / den as f64
            };
            weight * p.ln()
        })
        .sum();
    bp * log_sum.exp()
}

#[async_trait]
impl Metric for Bleu {
    fn name(&self) -> &'static str {
        "bleu"
    }

    async fn score_many(
        &self,
        references: &[Vec<String>],
        candidates: &[String],
    ) -> Result<ScoreColumns, MetricError> {
        check_aligned(self.name(), references, candidates)?;
        let scores = references
            .iter()
            .zip(candidates)
            .map(|(refs, cand)| {
                let refs: Vec<Vec<String>> = refs.iter().map(|r| self.tokens(r)).collect();
                sentence_bleu(&refs, &self.tokens(cand))
            })
            .collect();
        Ok(ScoreColumns::from([(BLEU_COLUMN.to_string(), scores)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(s: &str) -> Vec<String> {
        whitespace_tokens(s)
    }

    #[test]
    fn identical_sentence_scores_one() {
        let s = "the quick brown fox jumps over the lazy dog";
        let score = sentence_bleu(&[toks(s)], &toks(s));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn no_unigram_match_is_zero() {
        assert_eq!(sentence_bleu(&[toks("a b c d")], &toks("w x y z")), 0.0);
        assert_eq!(sentence_bleu(&[toks("a b c d")], &[]), 0.0);
    }

    #[test]
    fn short_hypothesis_collapses_without_smoothing() {
        // Unigram matches but no 4-grams exist.
        let score = sentence_bleu(&[toks("Paris")], &toks("Paris"));
        assert!(score > 0.0);
        assert!(score < 1e-50);
    }

    #[test]
    fn clipping_limits_repeated_words() {
        let refs = [toks("the cat is on the mat")];
        let (num, den) = modified_precision(&refs, &toks("the the the the the the the"), 1);
        assert_eq!((num, den), (2, 7));
    }

    #[test]
    fn closest_reference_prefers_shorter_on_tie() {
        let refs = [toks("a b"), toks("a b c d")];
        assert_eq!(closest_ref_length(&refs, 3), 2);
    }

    #[test]
    fn brevity_penalty_matches_definition() {
        assert_eq!(brevity_penalty(5, 6), 1.0);
        assert_eq!(brevity_penalty(5, 0), 0.0);
        assert!((brevity_penalty(6, 3) - (-1.0f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn known_value_with_partial_overlap() {
        // 1-gram 5/6, 2-gram 3/5, 3-gram 2/4, 4-gram 1/3, equal lengths.
        let refs = [toks("the cat sat on the mat")];
        let hyp = toks("the cat sat on a mat");
        let expected = ((5.0f64 / 6.0).ln() + (3.0f64 / 5.0).ln() + (2.0f64 / 4.0).ln()
            + (1.0f64 / 3.0).ln())
            / 4.0;
        assert!((sentence_bleu(&refs, &hyp) - expected.exp()).abs() < 1e-12);
    }

    #[tokio::test]
    async fn char_mode_scores_characters() {
        let words = Bleu::new(BleuTokenizer::Words)
            .score_many(&[vec!["Paris".into()]], &["Paris".into()])
            .await
            .unwrap();
        let chars = Bleu::new(BleuTokenizer::Chars)
            .score_many(&[vec!["Paris".into()]], &["Paris".into()])
            .await
            .unwrap();
        assert!(words[BLEU_COLUMN][0] < 1e-50);
        assert!((chars[BLEU_COLUMN][0] - 1.0).abs() < 1e-12);
    }
}
