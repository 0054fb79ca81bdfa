use serde::{Deserialize, Serialize};
use std::fmt;

/// One question with its candidate retrieval documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetItem {
    pub question: String,
    #[serde(default)]
    pub relevant_docs: Vec<String>,
    #[serde(default)]
    pub irrelevant_docs: Vec<String>,
    #[serde(default)]
    pub gold_answer: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocLabel {
    Relevant,
    Irrelevant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub text: String,
    pub label: DocLabel,
}

impl Document {
    pub fn relevant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: DocLabel::Relevant,
        }
    }

    pub fn irrelevant(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: DocLabel::Irrelevant,
        }
    }
}

/// Which documents a trial exposes to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCondition {
    RelevantOnly,
    IrrelevantOnly,
    Mixed,
}

impl ContextCondition {
    pub const ALL: [ContextCondition; 3] = [
        ContextCondition::RelevantOnly,
        ContextCondition::IrrelevantOnly,
        ContextCondition::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextCondition::RelevantOnly => "relevant_only",
            ContextCondition::IrrelevantOnly => "irrelevant_only",
            ContextCondition::Mixed => "mixed",
        }
    }

    /// Only the mixed condition reorders documents.
    pub fn shuffles(&self) -> bool {
        matches!(self, ContextCondition::Mixed)
    }

    pub fn includes_relevant(&self) -> bool {
        matches!(self, ContextCondition::RelevantOnly | ContextCondition::Mixed)
    }

    pub fn includes_irrelevant(&self) -> bool {
        matches!(
            self,
            ContextCondition::IrrelevantOnly | ContextCondition::Mixed
        )
    }
}

impl fmt::Display for ContextCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Joins message contents into the flat prompt used by text-only backends.
pub fn flatten_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One generated answer for one (item, condition, model, variant) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub item_index: usize,
    pub model_name: String,
    pub prompt_variant: String,
    pub context_condition: ContextCondition,
    pub question: String,
    pub gold_answer: String,
    pub context: String,
    pub documents: Vec<Document>,
    pub system_prompt: Option<String>,
    pub user_prompt: Option<String>,
    pub model_answer: String,
}

pub const ERROR_ANSWER_PREFIX: &str = "[ERROR]";

impl EvaluationRecord {
    pub fn is_error(&self) -> bool {
        self.model_answer.starts_with(ERROR_ANSWER_PREFIX)
    }
}

/// Answer text recorded in place of a model answer when a unit fails.
pub fn error_answer(message: &str) -> String {
    format!("{} {}", ERROR_ANSWER_PREFIX, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serializes_with_lowercase_label() {
        let doc = Document::relevant("Paris is the capital of France.");
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(
            v,
            serde_json::json!({"text": "Paris is the capital of France.", "label": "relevant"})
        );
    }

    #[test]
    fn condition_wire_names() {
        for c in ContextCondition::ALL {
            let v = serde_json::to_value(c).unwrap();
            assert_eq!(v.as_str(), Some(c.as_str()));
        }
        assert!(ContextCondition::Mixed.shuffles());
        assert!(!ContextCondition::RelevantOnly.shuffles());
    }

    #[test]
    fn dataset_item_defaults_optional_fields() {
        let item: DatasetItem = serde_json::from_str(r#"{"question": "Q?"}"#).unwrap();
        assert!(item.relevant_docs.is_empty());
        assert!(item.irrelevant_docs.is_empty());
        assert_eq!(item.gold_answer, "");
    }

    #[test]
    fn flatten_joins_with_newline() {
        let msgs = vec![Message::system("a"), Message::user("b")];
        assert_eq!(flatten_messages(&msgs), "a\nb");
    }
}
