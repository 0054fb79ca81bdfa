use super::{LlmClient, LlmRequest, LlmResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// In-process backend for tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct FakeClient {
    fixed_response: Option<String>,
    fail_when_contains: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.fixed_response = Some(response.into());
        self
    }

    /// Fails any request whose flattened prompt contains `needle`.
    pub fn failing_when_contains(mut self, needle: impl Into<String>) -> Self {
        self.fail_when_contains = Some(needle.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(&self, model: &str, request: LlmRequest<'_>) -> anyhow::Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let prompt = request.to_text();

        if let Some(needle) = &self.fail_when_contains {
            if prompt.contains(needle.as_str()) {
                anyhow::bail!("fake backend refused prompt containing '{}'", needle);
            }
        }

        // Default: echo the last line so answers are traceable to prompts.
        let text = self.fixed_response.clone().unwrap_or_else(|| {
            prompt
                .lines()
                .last()
                .unwrap_or_default()
                .to_string()
        });

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: model.to_string(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
