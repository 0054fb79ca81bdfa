//! Wires a [`SweepConfig`] into a runnable sweep.

use crate::config::{BackendsConfig, SweepConfig};
use crate::dataset::load_dataset;
use crate::engine::{plan_units, RunOutput, Runner};
use crate::invoker::{AnswerExtraction, ModelInvoker};
use crate::providers::http::HttpTransport;
use crate::providers::llm::gemini::GeminiClient;
use crate::providers::llm::ollama::OllamaClient;
use crate::providers::llm::openai::OpenAIClient;
use crate::providers::llm::traced::TracingLlmClient;
use crate::providers::llm::{Backend, LlmClient};
use crate::report::jsonl::write_jsonl;
use crate::report::progress::ProgressSink;
use anyhow::Context;
use std::sync::Arc;

/// One traced client per backend, all sharing `transport`.
pub fn build_invoker(
    backends: &BackendsConfig,
    extraction: AnswerExtraction,
    transport: HttpTransport,
) -> ModelInvoker {
    let ollama = Arc::new(OllamaClient::new(&backends.ollama_url, transport.clone()));
    let gemini = Arc::new(GeminiClient::from_env(
        &backends.gemini_url,
        &backends.gemini_api_key_env,
        transport.clone(),
    ));
    let openai = Arc::new(OpenAIClient::from_env(
        &backends.openai_url,
        &backends.openai_api_key_env,
        transport,
    ));

    ModelInvoker::new(extraction)
        .with_backend(Backend::LocalChat, traced(ollama))
        .with_backend(Backend::HostedGenerate, traced(gemini))
        .with_backend(Backend::HostedChat, traced(openai))
}

fn traced(client: Arc<dyn LlmClient>) -> Arc<dyn LlmClient> {
    Arc::new(TracingLlmClient::new(client))
}

/// Loads the dataset, runs the full cross-product and writes the results
/// file. Dataset problems fail before any unit runs.
pub async fn run_sweep(
    cfg: &SweepConfig,
    invoker: Arc<ModelInvoker>,
    progress: Option<ProgressSink>,
) -> anyhow::Result<RunOutput> {
    let items = load_dataset(&cfg.dataset)?;
    let variants = cfg.variants()?;
    let models = cfg.model_specs();

    tracing::info!(
        items = items.len(),
        conditions = cfg.conditions.len(),
        models = models.len(),
        variants = variants.len(),
        seed = cfg.seed,
        "planning sweep"
    );
    let units = plan_units(&items, &cfg.conditions, &models, &variants, cfg.seed);

    let out = Runner::new(invoker, cfg.parallelism())
        .run(units, progress)
        .await?;

    write_jsonl(&cfg.output, &out.records())
        .with_context(|| format!("failed to write results to {}", cfg.output.display()))?;
    tracing::info!(path = %cfg.output.display(), records = out.outcomes.len(), "results written");

    Ok(out)
}
