use crate::model::{flatten_messages, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub mod fake;
pub mod gemini;
pub mod ollama;
pub mod openai;
pub mod traced;

/// Closed set of model-serving interfaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Local chat-completion service (Ollama); takes structured messages.
    LocalChat,
    /// Hosted generative-text service (Gemini); takes one flat prompt.
    HostedGenerate,
    /// Hosted chat API (OpenAI Responses); takes one flat prompt.
    HostedChat,
}

impl Backend {
    pub const ALL: [Backend; 3] = [
        Backend::LocalChat,
        Backend::HostedGenerate,
        Backend::HostedChat,
    ];

    /// Default for a model entry that names no backend: `gemini*` models are
    /// hosted, everything else is served locally.
    pub fn infer(model: &str) -> Self {
        if model.starts_with("gemini") {
            Backend::HostedGenerate
        } else {
            Backend::LocalChat
        }
    }

    pub fn takes_messages(&self) -> bool {
        matches!(self, Backend::LocalChat)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::LocalChat => "local_chat",
            Backend::HostedGenerate => "hosted_generate",
            Backend::HostedChat => "hosted_chat",
        }
    }
}

/// What a backend is asked to complete.
#[derive(Debug, Clone, Copy)]
pub enum LlmRequest<'a> {
    Chat(&'a [Message]),
    Text(&'a str),
}

impl LlmRequest<'_> {
    /// Flat prompt form; chat turns are joined by newlines.
    pub fn to_text(&self) -> String {
        match self {
            LlmRequest::Chat(messages) => flatten_messages(messages),
            LlmRequest::Text(text) => (*text).to_string(),
        }
    }

    /// Structured form; flat text becomes a single user turn.
    pub fn to_messages(&self) -> Vec<Message> {
        match self {
            LlmRequest::Chat(messages) => messages.to_vec(),
            LlmRequest::Text(text) => vec![Message::user(*text)],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, model: &str, request: LlmRequest<'_>) -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}
