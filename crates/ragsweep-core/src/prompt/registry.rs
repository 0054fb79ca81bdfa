//! Named RAG prompt templates and their derived variants.

use crate::errors::TemplateError;
use serde::{Deserialize, Serialize};

/// A named template: a system instruction plus a user turn carrying the
/// `{question}` and `{context}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
    /// Substring after which the final answer starts in the model output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_marker: Option<String>,
}

/// A concrete prompt shape sent to a model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVariant {
    pub name: String,
    pub system: Option<String>,
    pub user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer_marker: Option<String>,
}

impl PromptVariant {
    pub fn new(
        name: impl Into<String>,
        system: Option<String>,
        user: Option<String>,
    ) -> Result<Self, TemplateError> {
        let name = name.into();
        if system.is_none() && user.is_none() {
            return Err(TemplateError::EmptyVariant { name });
        }
        Ok(Self {
            name,
            system,
            user,
            answer_marker: None,
        })
    }

    pub fn with_answer_marker(mut self, marker: Option<String>) -> Self {
        self.answer_marker = marker;
        self
    }
}

/// Expands one named template into `<name>_base`, `<name>_system` and
/// `<name>_user`. The latter two carry the system and user text joined by a
/// newline in a single turn.
pub fn derive_variants(name: &str, template: &PromptTemplate) -> Vec<PromptVariant> {
    let merged = format!("{}\n{}", template.system, template.user);
    let marker = template.answer_marker.clone();
    vec![
        PromptVariant {
            name: format!("{}_base", name),
            system: Some(template.system.clone()),
            user: Some(template.user.clone()),
            answer_marker: marker.clone(),
        },
        PromptVariant {
            name: format!("{}_system", name),
            system: Some(merged.clone()),
            user: None,
            answer_marker: marker.clone(),
        },
        PromptVariant {
            name: format!("{}_user", name),
            system: None,
            user: Some(merged),
            answer_marker: marker,
        },
    ]
}

pub const BUILTIN_NAMES: [&str; 4] = ["langchain", "llamaindex", "claude_rag", "mastra_cot"];

pub const FINAL_ANSWER_MARKER: &str = "FINAL ANSWER:";

/// Returns one of the built-in templates by name.
pub fn builtin(name: &str) -> Result<PromptTemplate, TemplateError> {
    let (system, user, marker) = match name {
        "langchain" => (
            concat!(
                "You are an assistant for question-answering tasks. ",
                "If you don't know the answer, just say that you don't know. ",
                "Use one sentence maximum and keep the answer concise.\n",
            ),
            concat!(
                "Use the following pieces of retrieved context to answer the question. ",
                "Question: {question}\n",
                "Context: {context}\n",
                "Answer:",
            ),
            None,
        ),
        "llamaindex" => (
            concat!(
                "If you don't know the answer, just say that you don't know. ",
                "Use one sentence maximum and keep the answer concise.\n",
            ),
            concat!(
                "We have provided context information below.",
                "---------------------",
                "{context}",
                "---------------------",
                "Given this information, please answer the question: {question}",
            ),
            None,
        ),
        "claude_rag" => (
            concat!(
                "Please remain faithful to the underlying context, and only deviate from it ",
                "if you are 100% sure that you know the answer already. ",
                "Answer the question now, and avoid providing preamble such as 'Here is the answer', etc. ",
                "If you don't know the answer, just say that you don't know. ",
                "Use one sentence maximum and keep the answer concise.\n",
            ),
            concat!(
                "You have been tasked with helping us to answer the following query: ",
                "<query>",
                "{question}",
                "</query>",
                "You have access to the following documents which are meant to provide context as you answer the query:",
                "<documents>",
                "{context}",
                "</documents>",
            ),
            None,
        ),
        "mastra_cot" => (
            concat!(
                "You are a helpful assistant that answers questions based on the provided context.",
                "Follow these steps for each response:",
                "1. First, carefully analyze the retrieved context chunks and identify key information.",
                "2. Break down your thinking process about how the retrieved information relates to the query.",
                "3. Explain how you're connecting different pieces from the retrieved chunks.",
                "4. Draw conclusions based only on the evidence in the retrieved context.",
                "5. If the retrieved chunks don't contain enough information, explicitly state what's missing.",
                "Format your response as:",
                "THOUGHT PROCESS:",
                "- Step 1: [Initial analysis of retrieved chunks]",
                "- Step 2: [Connections between chunks]",
                "- Step 3: [Reasoning based on chunks]",
                "FINAL ANSWER:",
                "[Your concise answer based on the retrieved context. Use one sentence maximum]",
                "Important: When asked to answer a question, please base your answer only on the context provided in the tool. ",
                "If the context doesn't contain enough information to fully answer the question, please state that explicitly.",
                "If you don't know the answer, just say that you don't know. ",
                "Remember: Explain how you're using the retrieved information to reach your conclusions.\n",
            ),
            concat!("Question: {question}\n", "Context: {context}\n"),
            Some(FINAL_ANSWER_MARKER),
        ),
        other => {
            return Err(TemplateError::UnknownTemplate {
                name: other.to_string(),
            })
        }
    };

    Ok(PromptTemplate {
        system: system.to_string(),
        user: user.to_string(),
        answer_marker: marker.map(str::to_string),
    })
}

/// Ordered collection of named templates.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    templates: Vec<(String, PromptTemplate)>,
}

impl PromptRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// All built-in templates, in their canonical order.
    pub fn builtins() -> Self {
        let mut reg = Self::new();
        for name in BUILTIN_NAMES {
            if let Ok(t) = builtin(name) {
                reg.insert(name, t);
            }
        }
        reg
    }

    /// Adds or replaces a template. Replacement keeps the original position.
    pub fn insert(&mut self, name: impl Into<String>, template: PromptTemplate) {
        let name = name.into();
        if let Some(slot) = self.templates.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = template;
        } else {
            self.templates.push((name, template));
        }
    }

    pub fn get(&self, name: &str) -> Option<&PromptTemplate> {
        self.templates
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Every derived variant, three per template, in registry order.
    pub fn variants(&self) -> Vec<PromptVariant> {
        self.templates
            .iter()
            .flat_map(|(name, t)| derive_variants(name, t))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_three_variants_in_order() {
        let t = PromptTemplate {
            system: "S".into(),
            user: "U {question}".into(),
            answer_marker: None,
        };
        let v = derive_variants("x", &t);
        let names: Vec<_> = v.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["x_base", "x_system", "x_user"]);

        assert_eq!(v[0].system.as_deref(), Some("S"));
        assert_eq!(v[0].user.as_deref(), Some("U {question}"));
        assert_eq!(v[1].system.as_deref(), Some("S\nU {question}"));
        assert!(v[1].user.is_none());
        assert!(v[2].system.is_none());
        assert_eq!(v[2].user.as_deref(), Some("S\nU {question}"));
    }

    #[test]
    fn builtins_expand_to_twelve_variants() {
        let reg = PromptRegistry::builtins();
        assert_eq!(reg.len(), 4);
        assert_eq!(reg.variants().len(), 12);
    }

    #[test]
    fn only_mastra_cot_carries_a_marker() {
        let reg = PromptRegistry::builtins();
        for v in reg.variants() {
            if v.name.starts_with("mastra_cot") {
                assert_eq!(v.answer_marker.as_deref(), Some(FINAL_ANSWER_MARKER));
            } else {
                assert!(v.answer_marker.is_none(), "{} has a marker", v.name);
            }
        }
    }

    #[test]
    fn unknown_builtin_is_an_error() {
        assert!(matches!(
            builtin("nope"),
            Err(TemplateError::UnknownTemplate { .. })
        ));
    }

    #[test]
    fn variant_without_templates_is_rejected() {
        assert!(PromptVariant::new("empty", None, None).is_err());
        assert!(PromptVariant::new("sys", Some("s".into()), None).is_ok());
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut reg = PromptRegistry::builtins();
        let custom = PromptTemplate {
            system: "s".into(),
            user: "u".into(),
            answer_marker: None,
        };
        reg.insert("llamaindex", custom.clone());
        let names: Vec<_> = reg.names().collect();
        assert_eq!(names, BUILTIN_NAMES);
        assert_eq!(reg.get("llamaindex"), Some(&custom));
    }
}
