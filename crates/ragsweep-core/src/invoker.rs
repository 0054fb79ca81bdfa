//! One model call: backend selection, prompt shape, answer extraction.

use crate::errors::InvokeError;
use crate::model::Message;
use crate::providers::llm::{Backend, LlmClient, LlmRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// How the text after an answer marker is extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerExtraction {
    /// The single character right after the marker. Reproduces answers from
    /// earlier sweeps exactly; a marker at the very end is an error.
    #[default]
    FirstChar,
    /// Everything after the marker, trimmed.
    Remainder,
}

/// Applies the answer marker to a trimmed response. Responses without the
/// marker are returned whole.
pub fn extract_answer(
    text: &str,
    marker: Option<&str>,
    mode: AnswerExtraction,
) -> Result<String, InvokeError> {
    let Some(marker) = marker else {
        return Ok(text.to_string());
    };
    let Some(start) = text.find(marker) else {
        return Ok(text.to_string());
    };
    let rest = &text[start + marker.len()..];

    match mode {
        AnswerExtraction::FirstChar => rest
            .chars()
            .next()
            .map(|c| c.to_string())
            .ok_or_else(|| InvokeError::MarkerAtEnd {
                marker: marker.to_string(),
            }),
        AnswerExtraction::Remainder => Ok(rest.trim().to_string()),
    }
}

/// A model under test and the backend that serves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub backend: Backend,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, backend: Backend) -> Self {
        Self {
            name: name.into(),
            backend,
        }
    }

    /// Backend chosen from the model name (`gemini*` is hosted).
    pub fn inferred(name: impl Into<String>) -> Self {
        let name = name.into();
        let backend = Backend::infer(&name);
        Self { name, backend }
    }
}

pub struct ModelInvoker {
    backends: HashMap<Backend, Arc<dyn LlmClient>>,
    extraction: AnswerExtraction,
}

impl ModelInvoker {
    pub fn new(extraction: AnswerExtraction) -> Self {
        Self {
            backends: HashMap::new(),
            extraction,
        }
    }

    pub fn with_backend(mut self, backend: Backend, client: Arc<dyn LlmClient>) -> Self {
        self.backends.insert(backend, client);
        self
    }

    /// Serves every backend variant from one client.
    pub fn uniform(client: Arc<dyn LlmClient>, extraction: AnswerExtraction) -> Self {
        let mut inv = Self::new(extraction);
        for b in Backend::ALL {
            inv.backends.insert(b, client.clone());
        }
        inv
    }

    pub fn extraction(&self) -> AnswerExtraction {
        self.extraction
    }

    /// Calls the model's backend and returns the trimmed (and possibly
    /// marker-truncated) answer. Backend errors are returned unchanged.
    pub async fn invoke(
        &self,
        model: &ModelSpec,
        messages: &[Message],
        answer_marker: Option<&str>,
    ) -> anyhow::Result<String> {
        let client = self.backends.get(&model.backend).ok_or_else(|| {
            anyhow::anyhow!(
                "no client configured for backend '{}' (model {})",
                model.backend.as_str(),
                model.name
            )
        })?;

        let flat;
        let request = if model.backend.takes_messages() {
            LlmRequest::Chat(messages)
        } else {
            flat = crate::model::flatten_messages(messages);
            LlmRequest::Text(&flat)
        };

        let resp = client.complete(&model.name, request).await?;
        let answer = extract_answer(resp.text.trim(), answer_marker, self.extraction)?;
        Ok(answer)
    }
}
