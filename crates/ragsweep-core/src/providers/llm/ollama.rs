use super::{LlmClient, LlmRequest, LlmResponse};
use crate::errors::ProviderError;
use crate::providers::http::HttpTransport;
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Local chat-completion backend (`POST /api/chat`, non-streaming).
pub struct OllamaClient {
    pub base_url: String,
    transport: HttpTransport,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, transport: HttpTransport) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, model: &str, request: LlmRequest<'_>) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/api/chat", self.base_url);
        let body = json!({
            "model": model,
            "messages": request.to_messages(),
            "stream": false,
        });

        let resp = self.transport.post_json(&url, &body, None).await?;
        if !resp.is_success() {
            return Err(ProviderError::Status {
                provider: "ollama".into(),
                status: resp.status,
                body: resp.body_text(),
            }
            .into());
        }

        let text = resp
            .body
            .pointer("/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: "ollama".into(),
                detail: "missing message.content".into(),
            })?
            .to_string();

        Ok(LlmResponse {
            text,
            provider: "ollama".to_string(),
            model: model.to_string(),
            meta: json!({
                "usage": {
                    "input_tokens": resp.body.get("prompt_eval_count"),
                    "output_tokens": resp.body.get("eval_count"),
                }
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }
}
