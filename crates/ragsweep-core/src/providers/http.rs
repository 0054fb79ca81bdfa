use crate::providers::network::check_outbound;
use crate::vcr::{send_json, VcrClient, VcrMode, VcrResponse};
use std::sync::Arc;
use std::time::Duration;

/// JSON-over-HTTP transport shared by every backend and embedder.
///
/// Either talks to the network directly or goes through a shared VCR client.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    /// Optional VCR client for record/replay, shared by every clone.
    vcr: Option<Arc<VcrClient>>,
    vcr_mode: VcrMode,
}

impl HttpTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            vcr: None,
            vcr_mode: VcrMode::Off,
        }
    }

    pub fn with_vcr(client: reqwest::Client, vcr: VcrClient) -> Self {
        let vcr_mode = vcr.mode();
        Self {
            client,
            vcr: Some(Arc::new(vcr)),
            vcr_mode,
        }
    }

    /// Builds the HTTP client and enables VCR if `RAGSWEEP_VCR_MODE` is set.
    pub fn from_env(timeout: Option<Duration>) -> anyhow::Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build()?;

        if VcrMode::from_env() != VcrMode::Off {
            let vcr = VcrClient::from_env(client.clone());
            tracing::info!(
                mode = ?vcr.mode(),
                cassettes = vcr.cassette_count(),
                "VCR enabled for backend calls"
            );
            Ok(Self::with_vcr(client, vcr))
        } else {
            Ok(Self::new(client))
        }
    }

    /// True when answers come from cassettes and no live call is made.
    pub fn is_replay(&self) -> bool {
        self.vcr_mode == VcrMode::Replay
    }

    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: Option<(&str, &str)>,
    ) -> anyhow::Result<VcrResponse> {
        if !self.is_replay() {
            check_outbound(url)?;
        }
        match &self.vcr {
            Some(vcr) => vcr.post_json(url, body, credential).await,
            None => send_json(&self.client, url, body, credential).await,
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(reqwest::Client::new())
    }
}
