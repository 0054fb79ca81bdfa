use super::load_config;
use crate::cli::args::ScoreArgs;
use crate::exit_codes;
use ragsweep_core::providers::http::HttpTransport;
use ragsweep_metrics::default_metrics;
use ragsweep_metrics::embedder::build_embedder;
use ragsweep_metrics::score::run_scoring;

pub async fn run(args: ScoreArgs) -> anyhow::Result<i32> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(p) = args.results {
        cfg.scoring.results = Some(p);
    }
    if let Some(p) = args.output {
        cfg.scoring.output = p;
    }
    if let Some(l) = args.layout {
        cfg.scoring.layout = l.into();
    }
    if let Some(e) = args.embedder {
        cfg.scoring.bert_score.embedder = e.into();
    }

    let results = cfg.results_path().to_path_buf();
    if !results.exists() {
        anyhow::bail!("results file not found: {}", results.display());
    }

    let transport = HttpTransport::from_env(cfg.backends.timeout())?;
    let embedder = build_embedder(&cfg.scoring.bert_score, &cfg.backends.ollama_url, transport);
    let metrics = default_metrics(&cfg.scoring, embedder);

    match run_scoring(&results, &cfg.scoring.output, cfg.scoring.layout, &metrics).await {
        Ok(report) => {
            eprintln!(
                "scored {} rows -> {}",
                report.rows,
                cfg.scoring.output.display()
            );
            Ok(exit_codes::SUCCESS)
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "scoring failed");
            eprintln!("scoring failed: {e:#}");
            Ok(exit_codes::SCORING_FAILED)
        }
    }
}
