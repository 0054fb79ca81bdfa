//! Sweep configuration (`ragsweep.yaml`).
//!
//! Every field has a default, so an absent config file reproduces the stock
//! sweep: four local models, all three context conditions, the four built-in
//! prompt families.

use crate::errors::{ConfigError, TemplateError};
use crate::invoker::{AnswerExtraction, ModelSpec};
use crate::model::ContextCondition;
use crate::prompt::{builtin, PromptRegistry, PromptTemplate, PromptVariant, BUILTIN_NAMES};
use crate::providers::llm::gemini::{DEFAULT_GEMINI_KEY_ENV, DEFAULT_GEMINI_URL};
use crate::providers::llm::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::llm::openai::{DEFAULT_OPENAI_KEY_ENV, DEFAULT_OPENAI_URL};
use crate::providers::llm::Backend;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;
pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_DATASET_PATH: &str = "data/input_data.json";
pub const DEFAULT_OUTPUT_PATH: &str = "results/rag_results.jsonl";
pub const DEFAULT_METRICS_PATH: &str = "results/metric_scores.json";
pub const DEFAULT_MODELS: [&str; 4] = ["llama2:7b", "llama3.2", "llama3.2:1b", "qwen3:4b"];
pub const SAMPLE_CONFIG: &str = include_str!("../ragsweep.sample.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_dataset")]
    pub dataset: PathBuf,
    #[serde(default = "default_output")]
    pub output: PathBuf,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Concurrent units; defaults to the host's available parallelism.
    #[serde(default)]
    pub parallel: Option<usize>,
    #[serde(default = "default_models")]
    pub models: Vec<ModelEntry>,
    #[serde(default = "default_conditions")]
    pub conditions: Vec<ContextCondition>,
    #[serde(default)]
    pub prompts: PromptsConfig,
    #[serde(default)]
    pub answer_extraction: AnswerExtraction,
    #[serde(default)]
    pub backends: BackendsConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
}

/// A model given either as a bare name or as `{name, backend}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelEntry {
    Name(String),
    Spec {
        name: String,
        #[serde(default)]
        backend: Option<Backend>,
    },
}

impl ModelEntry {
    pub fn to_spec(&self) -> ModelSpec {
        match self {
            ModelEntry::Name(name) => ModelSpec::inferred(name.clone()),
            ModelEntry::Spec {
                name,
                backend: Some(b),
            } => ModelSpec::new(name.clone(), *b),
            ModelEntry::Spec {
                name,
                backend: None,
            } => ModelSpec::inferred(name.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromptsConfig {
    /// Built-in prompt families to include, in order.
    #[serde(default = "default_builtin_prompts")]
    pub builtin: Vec<String>,
    /// Additional families; a name matching a built-in replaces it.
    #[serde(default)]
    pub custom: Vec<NamedTemplate>,
    /// If set, keep only these derived variant names.
    #[serde(default)]
    pub only: Option<Vec<String>>,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            builtin: default_builtin_prompts(),
            custom: Vec::new(),
            only: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedTemplate {
    pub name: String,
    #[serde(flatten)]
    pub template: PromptTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BackendsConfig {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_gemini_url")]
    pub gemini_url: String,
    #[serde(default = "default_gemini_key_env")]
    pub gemini_api_key_env: String,
    #[serde(default = "default_openai_url")]
    pub openai_url: String,
    #[serde(default = "default_openai_key_env")]
    pub openai_api_key_env: String,
    /// Per-request HTTP timeout. Unset means calls may block indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            gemini_url: default_gemini_url(),
            gemini_api_key_env: default_gemini_key_env(),
            openai_url: default_openai_url(),
            openai_api_key_env: default_openai_key_env(),
            timeout_secs: None,
        }
    }
}

impl BackendsConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Shape of the metrics file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricsLayout {
    /// `{"<column>": [per-row values]}`
    Columns,
    /// Result rows with reference and metric columns appended.
    #[default]
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BleuTokenizer {
    #[default]
    Words,
    /// Character n-grams, as produced by scoring raw strings.
    Chars,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbedderKind {
    /// Offline feature-hashing embedder.
    Hash,
    #[default]
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BertScoreConfig {
    #[serde(default)]
    pub embedder: EmbedderKind,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_tokenizer_mode")]
    pub tokenizer: String,
    /// Rescale scores against these baseline values when set.
    #[serde(default)]
    pub baseline: Option<BaselineScores>,
}

impl Default for BertScoreConfig {
    fn default() -> Self {
        Self {
            embedder: EmbedderKind::default(),
            model: default_embedding_model(),
            lang: default_lang(),
            tokenizer: default_tokenizer_mode(),
            baseline: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScoringConfig {
    /// Results file to score; defaults to the sweep's `output`.
    #[serde(default)]
    pub results: Option<PathBuf>,
    #[serde(default = "default_metrics_output")]
    pub output: PathBuf,
    #[serde(default)]
    pub layout: MetricsLayout,
    #[serde(default)]
    pub bleu_tokenizer: BleuTokenizer,
    #[serde(default)]
    pub bert_score: BertScoreConfig,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            results: None,
            output: default_metrics_output(),
            layout: MetricsLayout::default(),
            bleu_tokenizer: BleuTokenizer::default(),
            bert_score: BertScoreConfig::default(),
        }
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            dataset: default_dataset(),
            output: default_output(),
            seed: DEFAULT_SEED,
            parallel: None,
            models: default_models(),
            conditions: default_conditions(),
            prompts: PromptsConfig::default(),
            answer_extraction: AnswerExtraction::default(),
            backends: BackendsConfig::default(),
            scoring: ScoringConfig::default(),
        }
    }
}

impl SweepConfig {
    pub fn model_specs(&self) -> Vec<ModelSpec> {
        self.models.iter().map(ModelEntry::to_spec).collect()
    }

    /// Built-in families first (in listed order), then custom ones.
    pub fn registry(&self) -> Result<PromptRegistry, TemplateError> {
        let mut reg = PromptRegistry::new();
        for name in &self.prompts.builtin {
            reg.insert(name.clone(), builtin(name)?);
        }
        for named in &self.prompts.custom {
            reg.insert(named.name.clone(), named.template.clone());
        }
        Ok(reg)
    }

    /// Derived variants after the optional `only` filter.
    pub fn variants(&self) -> Result<Vec<PromptVariant>, ConfigError> {
        let reg = self
            .registry()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        let all = reg.variants();
        let Some(only) = &self.prompts.only else {
            return Ok(all);
        };
        if let Some(missing) = only.iter().find(|n| !all.iter().any(|v| &v.name == *n)) {
            return Err(ConfigError::Invalid(format!(
                "prompts.only names unknown variant '{}'",
                missing
            )));
        }
        Ok(all
            .into_iter()
            .filter(|v| only.iter().any(|n| *n == v.name))
            .collect())
    }

    pub fn parallelism(&self) -> usize {
        self.parallel
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(4)
            })
            .max(1)
    }

    pub fn results_path(&self) -> &Path {
        self.scoring.results.as_deref().unwrap_or(&self.output)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != SUPPORTED_CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: SUPPORTED_CONFIG_VERSION,
            });
        }
        if self.models.is_empty() {
            return Err(ConfigError::Invalid("no models configured".into()));
        }
        if self.conditions.is_empty() {
            return Err(ConfigError::Invalid(
                "no context conditions configured".into(),
            ));
        }
        if self.parallel == Some(0) {
            return Err(ConfigError::Invalid("parallel must be at least 1".into()));
        }
        if self.variants()?.is_empty() {
            return Err(ConfigError::Invalid("no prompt variants configured".into()));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<SweepConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let cfg: SweepConfig = serde_yaml::from_str(&raw).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads `path` when given, otherwise the compiled-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<SweepConfig, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(SweepConfig::default()),
    }
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn default_version() -> u32 {
    SUPPORTED_CONFIG_VERSION
}
fn default_dataset() -> PathBuf {
    PathBuf::from(DEFAULT_DATASET_PATH)
}
fn default_output() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_PATH)
}
fn default_metrics_output() -> PathBuf {
    PathBuf::from(DEFAULT_METRICS_PATH)
}
fn default_seed() -> u64 {
    DEFAULT_SEED
}
fn default_models() -> Vec<ModelEntry> {
    DEFAULT_MODELS
        .iter()
        .map(|m| ModelEntry::Name((*m).to_string()))
        .collect()
}
fn default_conditions() -> Vec<ContextCondition> {
    ContextCondition::ALL.to_vec()
}
fn default_builtin_prompts() -> Vec<String> {
    BUILTIN_NAMES.iter().map(|s| (*s).to_string()).collect()
}
fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}
fn default_gemini_url() -> String {
    DEFAULT_GEMINI_URL.to_string()
}
fn default_gemini_key_env() -> String {
    DEFAULT_GEMINI_KEY_ENV.to_string()
}
fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.to_string()
}
fn default_openai_key_env() -> String {
    DEFAULT_OPENAI_KEY_ENV.to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}
fn default_lang() -> String {
    "en".to_string()
}
fn default_tokenizer_mode() -> String {
    "fast".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults_match_stock_sweep() {
        let cfg = SweepConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.seed, 42);
        assert_eq!(cfg.model_specs().len(), 4);
        assert!(cfg
            .model_specs()
            .iter()
            .all(|m| m.backend == Backend::LocalChat));
        assert_eq!(cfg.conditions.len(), 3);
        assert_eq!(cfg.variants().unwrap().len(), 12);
        assert_eq!(cfg.results_path(), Path::new(DEFAULT_OUTPUT_PATH));
    }

    #[test]
    fn sample_config_parses_and_validates() {
        let cfg: SweepConfig = serde_yaml::from_str(SAMPLE_CONFIG).unwrap();
        cfg.validate().unwrap();
    }

    #[test]
    fn sample_baseline_block_parses_when_uncommented() {
        let uncommented = SAMPLE_CONFIG
            .lines()
            .map(|l| {
                let t = l.trim_start();
                if ["# baseline:", "#   precision:", "#   recall:", "#   f1:"]
                    .iter()
                    .any(|p| t.starts_with(p))
                {
                    l.replacen("# ", "", 1)
                } else {
                    l.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("\n");
        let cfg: SweepConfig = serde_yaml::from_str(&uncommented).unwrap();
        let baseline = cfg.scoring.bert_score.baseline.unwrap();
        assert_eq!(baseline.f1, 0.83);
        assert!(SweepConfig::default().scoring.bert_score.baseline.is_none());
    }

    #[test]
    fn model_entries_accept_names_and_specs() {
        let cfg: SweepConfig = serde_yaml::from_str(
            r#"
models:
  - llama3.2
  - gemini-2.5-flash
  - name: gpt-4o-mini
    backend: hosted_chat
  - name: gemini-proxy
    backend: local_chat
"#,
        )
        .unwrap();
        let specs = cfg.model_specs();
        assert_eq!(specs[0].backend, Backend::LocalChat);
        assert_eq!(specs[1].backend, Backend::HostedGenerate);
        assert_eq!(specs[2].backend, Backend::HostedChat);
        assert_eq!(specs[3].backend, Backend::LocalChat);
    }

    #[test]
    fn custom_templates_and_filter() {
        let cfg: SweepConfig = serde_yaml::from_str(
            r#"
prompts:
  builtin: [langchain]
  custom:
    - name: terse
      system: "Answer in one word."
      user: "{question}\n{context}"
  only: [langchain_base, terse_user]
"#,
        )
        .unwrap();
        let names: Vec<_> = cfg
            .variants()
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["langchain_base", "terse_user"]);
    }

    #[test]
    fn unknown_only_name_is_invalid() {
        let mut cfg = SweepConfig::default();
        cfg.prompts.only = Some(vec!["nope_base".into()]);
        assert!(matches!(cfg.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn wrong_version_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragsweep.yaml");
        std::fs::write(&path, "version: 2\n").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ragsweep.yaml");
        std::fs::write(&path, "version: 1\nmodel: llama3.2\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn zero_parallel_is_rejected() {
        let cfg = SweepConfig {
            parallel: Some(0),
            ..SweepConfig::default()
        };
        assert!(cfg.validate().is_err());
        assert_eq!(
            SweepConfig {
                parallel: Some(3),
                ..SweepConfig::default()
            }
            .parallelism(),
            3
        );
    }
}
