use ragsweep_core::model::{ContextCondition, EvaluationRecord};

/// Accepted answers when only irrelevant documents were shown.
pub const IDK_REFERENCES: [&str; 2] = [
    "I don't know",
    "The retrieved context does not contain information to answer the question",
];

/// Reference answers a record is scored against.
pub fn reference_answers(record: &EvaluationRecord) -> Vec<String> {
    match record.context_condition {
        ContextCondition::IrrelevantOnly => IDK_REFERENCES.iter().map(|s| s.to_string()).collect(),
        _ => vec![record.gold_answer.clone()],
    }
}
