use clap::{Parser, Subcommand, ValueEnum};
use ragsweep_core::config::{EmbedderKind, MetricsLayout};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "ragsweep",
    version,
    about = "Sweep RAG prompt variants across models and context conditions, then score the answers"
)]
pub struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate answers for every item x condition x model x prompt variant
    Run(RunArgs),
    /// Score a results file with ROUGE-L, BLEU and BERTScore
    Score(ScoreArgs),
    /// List the resolved prompt variants
    Variants(VariantsArgs),
    /// Write a sample ragsweep.yaml
    Init(InitArgs),
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    /// Config file; compiled-in defaults apply when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub dataset: Option<PathBuf>,
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Concurrent model calls
    #[arg(long)]
    pub parallel: Option<usize>,
}

#[derive(Parser, Clone)]
pub struct ScoreArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Results file (JSONL) to score
    #[arg(long)]
    pub results: Option<PathBuf>,
    /// Metrics file to write
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub layout: Option<LayoutArg>,
    /// Token embedder for BERTScore
    #[arg(long, value_enum)]
    pub embedder: Option<EmbedderArg>,
}

#[derive(Parser, Clone)]
pub struct VariantsArgs {
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "ragsweep.yaml")]
    pub path: PathBuf,
    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LayoutArg {
    Columns,
    Table,
}

impl From<LayoutArg> for MetricsLayout {
    fn from(v: LayoutArg) -> Self {
        match v {
            LayoutArg::Columns => MetricsLayout::Columns,
            LayoutArg::Table => MetricsLayout::Table,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum EmbedderArg {
    Hash,
    Ollama,
}

impl From<EmbedderArg> for EmbedderKind {
    fn from(v: EmbedderArg) -> Self {
        match v {
            EmbedderArg::Hash => EmbedderKind::Hash,
            EmbedderArg::Ollama => EmbedderKind::Ollama,
        }
    }
}
