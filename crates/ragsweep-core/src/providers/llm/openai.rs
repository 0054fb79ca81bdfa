use super::{LlmClient, LlmRequest, LlmResponse};
use crate::errors::ProviderError;
use crate::providers::http::HttpTransport;
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
pub const DEFAULT_OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Hosted chat backend on the Responses API. Sent a flat prompt as `input`.
pub struct OpenAIClient {
    pub base_url: String,
    api_key: Option<String>,
    key_env: String,
    transport: HttpTransport,
}

impl OpenAIClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        key_env: impl Into<String>,
        transport: HttpTransport,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            key_env: key_env.into(),
            transport,
        }
    }

    pub fn from_env(
        base_url: impl Into<String>,
        key_env: impl Into<String>,
        transport: HttpTransport,
    ) -> Self {
        let key_env = key_env.into();
        let api_key = std::env::var(&key_env).ok().filter(|k| !k.is_empty());
        Self::new(base_url, api_key, key_env, transport)
    }
}

/// Aggregated output text: the convenience field when present, otherwise every
/// `output_text` content item in order.
pub fn aggregate_output_text(body: &serde_json::Value) -> Option<String> {
    if let Some(text) = body.get("output_text").and_then(|v| v.as_str()) {
        return Some(text.to_string());
    }
    let output = body.get("output")?.as_array()?;
    let mut found = false;
    let mut text = String::new();
    for item in output {
        let Some(content) = item.get("content").and_then(|c| c.as_array()) else {
            continue;
        };
        for part in content {
            if part.get("type").and_then(|t| t.as_str()) == Some("output_text") {
                if let Some(t) = part.get("text").and_then(|t| t.as_str()) {
                    text.push_str(t);
                    found = true;
                }
            }
        }
    }
    found.then_some(text)
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, model: &str, request: LlmRequest<'_>) -> anyhow::Result<LlmResponse> {
        let url = format!("{}/v1/responses", self.base_url);
        let body = json!({
            "model": model,
            "input": request.to_text(),
        });

        let auth = self.api_key.as_ref().map(|k| format!("Bearer {}", k));
        let credential = match (&auth, self.transport.is_replay()) {
            (Some(a), _) => Some(("Authorization", a.as_str())),
            (None, true) => None,
            (None, false) => {
                return Err(ProviderError::MissingApiKey {
                    provider: "openai".into(),
                    env: self.key_env.clone(),
                }
                .into())
            }
        };

        let resp = self.transport.post_json(&url, &body, credential).await?;
        if !resp.is_success() {
            return Err(ProviderError::Status {
                provider: "openai".into(),
                status: resp.status,
                body: resp.body_text(),
            }
            .into());
        }

        let text =
            aggregate_output_text(&resp.body).ok_or_else(|| ProviderError::MalformedResponse {
                provider: "openai".into(),
                detail: "response carries no output_text".into(),
            })?;

        Ok(LlmResponse {
            text,
            provider: "openai".to_string(),
            model: model.to_string(),
            meta: json!({
                "usage": {
                    "input_tokens": resp.body.pointer("/usage/input_tokens"),
                    "output_tokens": resp.body.pointer("/usage/output_tokens"),
                }
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
