/// Scoring failures. Any of these aborts a score run.
#[derive(Debug, thiserror::Error)]
pub enum MetricError {
    #[error("{metric}: {references} reference rows but {candidates} candidates")]
    LengthMismatch {
        metric: &'static str,
        references: usize,
        candidates: usize,
    },

    #[error("{metric}: row {row} has no reference answers")]
    NoReferences { metric: &'static str, row: usize },

    #[error("embedding failed ({embedder}): {message}")]
    Embedding {
        embedder: &'static str,
        message: String,
    },

    #[error("embedding dimension mismatch: expected {expected}, got {found}")]
    Dimension { expected: usize, found: usize },
}

pub(crate) fn check_aligned(
    metric: &'static str,
    references: &[Vec<String>],
    candidates: &[String],
) -> Result<(), MetricError> {
    if references.len() != candidates.len() {
        return Err(MetricError::LengthMismatch {
            metric,
            references: references.len(),
            candidates: candidates.len(),
        });
    }
    if let Some(row) = references.iter().position(|r| r.is_empty()) {
        return Err(MetricError::NoReferences { metric, row });
    }
    Ok(())
}
