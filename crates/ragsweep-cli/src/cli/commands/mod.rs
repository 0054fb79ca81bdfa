pub mod init;
pub mod run;
pub mod score;
pub mod variants;

use super::args::{Cli, Command};
use ragsweep_core::config::{load_or_default, SweepConfig};
use std::path::Path;

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Score(args) => score::run(args).await,
        Command::Variants(args) => variants::run(args),
        Command::Init(args) => init::run(args),
    }
}

pub(crate) fn load_config(path: Option<&Path>) -> anyhow::Result<SweepConfig> {
    let cfg = load_or_default(path)?;
    match path {
        Some(p) => tracing::debug!(path = %p.display(), "loaded config"),
        None => tracing::debug!("no config file given, using defaults"),
    }
    Ok(cfg)
}
