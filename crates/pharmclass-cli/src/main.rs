//! pharmclass
//!
//! Batch classifier that maps pharmacy SKUs onto a category taxonomy
//! with an LLM and flags uncertain answers for manual review.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::PathBuf;
use tracing::info;

mod commands;
mod config;
mod input;
mod sink;

use config::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "pharmclass")]
#[command(about = "Pharmacy SKU classification with review flagging", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "pharmclass.yaml")]
    pub config: String,

    /// Provider base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Model name
    #[arg(short, long)]
    pub model: Option<String>,

    /// Confidence below which a result needs review
    #[arg(long)]
    pub confidence_threshold: Option<f32>,

    /// Confidence below which a result is a hard reject
    #[arg(long)]
    pub hard_reject_threshold: Option<f32>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub log_json: bool,

    /// Write Prometheus metrics to this file on exit
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Classify a JSON-lines file of SKUs
    Classify(ClassifyArgs),

    /// Classify a single SKU
    ClassifyOne(ClassifyOneArgs),

    /// Measure accuracy against a labeled test set
    Evaluate(EvaluateArgs),

    /// Show the categories an ingredient maps to
    Lookup(LookupArgs),
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Input SKUs, one JSON object per line
    #[arg(short, long)]
    pub input: PathBuf,

    /// Taxonomy file (YAML or JSON)
    #[arg(short, long)]
    pub taxonomy: PathBuf,

    /// Output file, results are appended
    #[arg(short, long)]
    pub output: PathBuf,

    /// Model calls in flight at once
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Classify at most this many SKUs
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Args, Debug)]
pub struct ClassifyOneArgs {
    /// SKU name
    #[arg(short, long)]
    pub name: String,

    /// Manufacturer
    #[arg(long)]
    pub manufacturer: Option<String>,

    /// Alternate SKU name
    #[arg(long)]
    pub alt_name: Option<String>,

    /// Taxonomy file (YAML or JSON)
    #[arg(short, long)]
    pub taxonomy: PathBuf,

    /// Print the raw model answer without applying decision rules
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct EvaluateArgs {
    /// Labeled SKUs, one JSON object per line
    #[arg(long)]
    pub testset: PathBuf,

    /// Taxonomy file (YAML or JSON)
    #[arg(short, long)]
    pub taxonomy: PathBuf,

    /// Evaluate at most this many samples
    #[arg(long)]
    pub limit: Option<usize>,

    /// Number of mismatches to print
    #[arg(long, default_value = "20")]
    pub show_mismatches: usize,
}

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Taxonomy file (YAML or JSON)
    #[arg(short, long)]
    pub taxonomy: PathBuf,

    /// Active ingredient name
    #[arg(short, long)]
    pub ingredient: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    let config = AppConfig::load(&cli.config, &cli)?;
    info!(
        config = %cli.config,
        base_url = %config.llm.base_url,
        model = %config.llm.model,
        "Configuration loaded"
    );

    let metrics_handle = init_metrics()?;

    match &cli.command {
        Command::Classify(args) => commands::classify(&config, args).await?,
        Command::ClassifyOne(args) => commands::classify_one(&config, args).await?,
        Command::Evaluate(args) => commands::evaluate_testset(&config, args).await?,
        Command::Lookup(args) => commands::lookup(args)?,
    }

    if let Some(path) = &cli.metrics_out {
        std::fs::write(path, metrics_handle.render())?;
        info!(path = %path.display(), "Metrics written");
    }

    Ok(())
}

/// Initialize tracing/logging on stderr so stdout stays machine-readable
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("pharmclass=debug,pharmclass_core=debug,pharmclass_policy=debug,pharmclass_classifiers=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("pharmclass=info,pharmclass_core=info,pharmclass_policy=info,pharmclass_classifiers=info")
        })
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Initialize metrics recorder and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "pharmclass_classifications_total",
        "Total number of SKUs processed by outcome"
    );
    metrics::describe_histogram!(
        "pharmclass_classification_latency_ms",
        metrics::Unit::Milliseconds,
        "Model call and decision latency in milliseconds"
    );

    Ok(handle)
}
