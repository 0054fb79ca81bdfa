//! VCR (Video Cassette Recording) middleware for backend request/response recording and replay.
//!
//! Lets a sweep be re-run offline with exactly the answers a previous run received.
//!
//! # Environment Variables
//!
//! - `RAGSWEEP_VCR_MODE`: `off` (default, live network), `record`, `replay`
//! - `RAGSWEEP_VCR_DIR`: Path to cassette directory (default: `results/cassettes`)
//!
//! # Matching
//!
//! Requests are matched by: method + URL + body (canonicalized JSON). Credential headers
//! are excluded from matching and never written to cassettes.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

pub const DEFAULT_CASSETTE_DIR: &str = "results/cassettes";

/// VCR mode: how to handle HTTP requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VcrMode {
    /// Replay from cassettes; fail if no match
    Replay,
    /// Record to cassettes; make real requests
    Record,
    /// Pass through to live network; no recording
    #[default]
    Off,
}

impl VcrMode {
    /// Parse from environment variable `RAGSWEEP_VCR_MODE`
    pub fn from_env() -> Self {
        Self::parse(&env::var("RAGSWEEP_VCR_MODE").unwrap_or_default())
    }

    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "record" => VcrMode::Record,
            "replay" => VcrMode::Replay,
            _ => VcrMode::Off,
        }
    }
}

/// A recorded HTTP request/response pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CassetteEntry {
    pub method: String,
    pub url: String,
    /// Request body (JSON, canonicalized for matching)
    pub request_body: Option<serde_json::Value>,
    /// Response status code
    pub status: u16,
    /// Response body
    pub response_body: serde_json::Value,
    /// Fingerprint used for matching (method + url + canonicalized body hash)
    pub fingerprint: String,
}

/// VCR client for HTTP request interception.
///
/// Shared across concurrent backend calls: the cassette cache sits behind a
/// short-lived lock and live requests run outside it.
pub struct VcrClient {
    mode: VcrMode,
    cassette_dir: PathBuf,
    /// fingerprint -> entry
    cache: Mutex<HashMap<String, CassetteEntry>>,
    inner: reqwest::Client,
}

impl VcrClient {
    /// Create a new VCR client with mode and directory from environment
    pub fn from_env(inner: reqwest::Client) -> Self {
        let mode = VcrMode::from_env();
        let cassette_dir = env::var("RAGSWEEP_VCR_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CASSETTE_DIR));

        Self::new(mode, cassette_dir, inner)
    }

    /// Create a new VCR client with explicit mode and directory
    pub fn new(mode: VcrMode, cassette_dir: PathBuf, inner: reqwest::Client) -> Self {
        let cache = if mode == VcrMode::Replay {
            load_cassettes(&cassette_dir)
        } else {
            HashMap::new()
        };

        Self {
            mode,
            cassette_dir,
            cache: Mutex::new(cache),
            inner,
        }
    }

    /// Compute fingerprint for request matching (excludes credential headers)
    pub fn fingerprint(method: &str, url: &str, body: Option<&serde_json::Value>) -> String {
        let mut hasher = Sha256::new();
        hasher.update(method.as_bytes());
        hasher.update(b"|");
        hasher.update(url.as_bytes());
        hasher.update(b"|");

        if let Some(b) = body {
            let canonical = serde_jcs::to_string(b).unwrap_or_else(|_| b.to_string());
            hasher.update(canonical.as_bytes());
        }

        hex::encode(hasher.finalize())
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<String, CassetteEntry>> {
        self.cache.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn save_cassette(&self, entry: &CassetteEntry, category: &str) -> anyhow::Result<()> {
        let dir = self.cassette_dir.join(category);
        fs::create_dir_all(&dir)?;

        let fp_prefix = if entry.fingerprint.len() >= 16 {
            &entry.fingerprint[..16]
        } else {
            &entry.fingerprint
        };
        let path = dir.join(format!("{}.json", fp_prefix));

        fs::write(path, serde_json::to_string_pretty(entry)?)?;
        Ok(())
    }

    fn category_from_url(url: &str) -> &'static str {
        if url.contains("/embed") {
            "embeddings"
        } else {
            "generations"
        }
    }

    /// Make a POST request with VCR handling. `credential` is a header
    /// (name, value) pair that is sent but never recorded.
    pub async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        credential: Option<(&str, &str)>,
    ) -> anyhow::Result<VcrResponse> {
        let fingerprint = Self::fingerprint("POST", url, Some(body));

        match self.mode {
            VcrMode::Replay => {
                let hit = self.cache().get(&fingerprint).map(|entry| VcrResponse {
                    status: entry.status,
                    body: entry.response_body.clone(),
                });
                hit.ok_or_else(|| {
                    anyhow::anyhow!(
                        "VCR replay: no cassette found for POST {} (fingerprint: {}). \
                        Run with RAGSWEEP_VCR_MODE=record to record responses.",
                        url,
                        &fingerprint[..16]
                    )
                })
            }
            VcrMode::Record => {
                let resp = send_json(&self.inner, url, body, credential).await?;

                let entry = CassetteEntry {
                    method: "POST".to_string(),
                    url: url.to_string(),
                    request_body: Some(body.clone()),
                    status: resp.status,
                    response_body: resp.body.clone(),
                    fingerprint: fingerprint.clone(),
                };

                let category = Self::category_from_url(url);
                if let Err(e) = self.save_cassette(&entry, category) {
                    tracing::warn!("VCR: failed to save cassette: {}", e);
                }

                self.cache().insert(fingerprint, entry);
                Ok(resp)
            }
            VcrMode::Off => send_json(&self.inner, url, body, credential).await,
        }
    }

    pub fn mode(&self) -> VcrMode {
        self.mode
    }

    pub fn cassette_count(&self) -> usize {
        self.cache().len()
    }
}

/// Cassettes from the category subdirectories and the directory itself.
fn load_cassettes(cassette_dir: &Path) -> HashMap<String, CassetteEntry> {
    let mut cache = HashMap::new();
    if !cassette_dir.exists() {
        return cache;
    }

    for subdir in &["embeddings", "generations"] {
        let dir = cassette_dir.join(subdir);
        if dir.exists() {
            load_cassettes_from_dir(&dir, &mut cache);
        }
    }
    load_cassettes_from_dir(cassette_dir, &mut cache);
    cache
}

fn load_cassettes_from_dir(dir: &Path, cache: &mut HashMap<String, CassetteEntry>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map(|e| e == "json").unwrap_or(false) {
            if let Ok(content) = fs::read_to_string(&path) {
                if let Ok(cassette) = serde_json::from_str::<CassetteEntry>(&content) {
                    cache.insert(cassette.fingerprint.clone(), cassette);
                }
            }
        }
    }
}

/// Sends one JSON POST and captures status and body. Non-JSON bodies are kept as a string.
pub(crate) async fn send_json(
    client: &reqwest::Client,
    url: &str,
    body: &serde_json::Value,
    credential: Option<(&str, &str)>,
) -> anyhow::Result<VcrResponse> {
    let mut req = client.post(url).json(body);
    if let Some((name, value)) = credential {
        req = req.header(name, value);
    }
    let resp = req.send().await?;

    let status = resp.status().as_u16();
    let text = resp.text().await.unwrap_or_default();
    let body = serde_json::from_str(&text).unwrap_or(serde_json::Value::String(text));

    Ok(VcrResponse { status, body })
}

/// Response from VCR client
#[derive(Debug)]
pub struct VcrResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl VcrResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body rendered for error messages.
    pub fn body_text(&self) -> String {
        match &self.body {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
