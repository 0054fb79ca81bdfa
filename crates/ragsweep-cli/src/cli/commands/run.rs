use super::load_config;
use crate::cli::args::RunArgs;
use crate::exit_codes;
use ragsweep_core::providers::http::HttpTransport;
use ragsweep_core::report::progress::log_progress_sink;
use ragsweep_core::sweep::{build_invoker, run_sweep};
use std::sync::Arc;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(p) = args.dataset {
        cfg.dataset = p;
    }
    if let Some(p) = args.output {
        cfg.output = p;
    }
    if let Some(s) = args.seed {
        cfg.seed = s;
    }
    if args.parallel.is_some() {
        cfg.parallel = args.parallel;
    }
    cfg.validate()?;

    let transport = HttpTransport::from_env(cfg.backends.timeout())?;
    let invoker = Arc::new(build_invoker(
        &cfg.backends,
        cfg.answer_extraction,
        transport,
    ));

    let out = run_sweep(&cfg, invoker, Some(log_progress_sink(10))).await?;

    eprintln!(
        "{} records written to {} ({} failed)",
        out.summary.total,
        cfg.output.display(),
        out.summary.failed
    );
    if out.summary.failed > 0 {
        Ok(exit_codes::UNIT_FAILURES)
    } else {
        Ok(exit_codes::SUCCESS)
    }
}
