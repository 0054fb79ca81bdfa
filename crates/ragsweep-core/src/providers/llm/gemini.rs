use super::{LlmClient, LlmRequest, LlmResponse};
use crate::errors::ProviderError;
use crate::providers::http::HttpTransport;
use async_trait::async_trait;
use serde_json::json;

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Hosted generative-text backend. Accepts flat text only.
pub struct GeminiClient {
    pub base_url: String,
    api_key: Option<String>,
    key_env: String,
    transport: HttpTransport,
}

impl GeminiClient {
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

    /// Reads the key from `key_env`; a missing key surfaces on first call.
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

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, model: &str, request: LlmRequest<'_>) -> anyhow::Result<LlmResponse> {
        // The API wants the bare model id.
        let model_id = model.strip_prefix("models/").unwrap_or(model);
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, model_id
        );
        let body = json!({
            "contents": [
                {"role": "user", "parts": [{"text": request.to_text()}]}
            ]
        });

        let credential = match (&self.api_key, self.transport.is_replay()) {
            (Some(key), _) => Some(("x-goog-api-key", key.as_str())),
            (None, true) => None,
            (None, false) => {
                return Err(ProviderError::MissingApiKey {
                    provider: "gemini".into(),
                    env: self.key_env.clone(),
                }
                .into())
            }
        };

        let resp = self.transport.post_json(&url, &body, credential).await?;
        if !resp.is_success() {
            return Err(ProviderError::Status {
                provider: "gemini".into(),
                status: resp.status,
                body: resp.body_text(),
            }
            .into());
        }

        let parts = resp
            .body
            .pointer("/candidates/0/content/parts")
            .and_then(|v| v.as_array())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: "gemini".into(),
                detail: format!(
                    "no candidate content (promptFeedback: {})",
                    resp.body
                        .get("promptFeedback")
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".into())
                ),
            })?;

        let text: String = parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect();

        Ok(LlmResponse {
            text,
            provider: "gemini".to_string(),
            model: model_id.to_string(),
            meta: json!({
                "usage": {
                    "input_tokens": resp.body.pointer("/usageMetadata/promptTokenCount"),
                    "output_tokens": resp.body.pointer("/usageMetadata/candidatesTokenCount"),
                }
            }),
        })
    }

    fn provider_name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Message;
    use serial_test::serial;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    #[serial]
    async fn flattens_messages_and_joins_parts() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
            .and(header("x-goog-api-key", "test-key"))
            .and(body_json(json!({
                "contents": [{"role": "user", "parts": [{"text": "S\nU"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "Par"}, {"text": "is\n"}]}}]
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(
            server.uri(),
            Some("test-key".into()),
            DEFAULT_GEMINI_KEY_ENV,
            HttpTransport::default(),
        );
        let msgs = [Message::system("S"), Message::user("U")];
        let resp = client
            .complete("gemini-2.5-flash", LlmRequest::Chat(&msgs))
            .await
            .unwrap();
        assert_eq!(resp.text, "Paris\n");
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiClient::new(
            "http://127.0.0.1:9",
            None,
            "SOME_UNSET_KEY",
            HttpTransport::default(),
        );
        let err = client
            .complete("gemini-2.5-flash", LlmRequest::Text("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SOME_UNSET_KEY"));
    }

    #[tokio::test]
    #[serial]
    async fn blocked_prompt_is_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .mount(&server)
            .await;

        let client = GeminiClient::new(
            server.uri(),
            Some("k".into()),
            DEFAULT_GEMINI_KEY_ENV,
            HttpTransport::default(),
        );
        let err = client
            .complete("gemini-2.5-flash", LlmRequest::Text("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }
}
