// Emogen - persona-conditioned emotion generation
// Main entry point

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use emogen::config::load_settings;
use emogen::data::max_count_from_sentinel;
use emogen::logging::init_tracing;
use emogen::pipeline::{Orchestrator, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "emogen", version, about = "Generate persona-conditioned emotion responses")]
struct Cli {
    /// Settings file (YAML, TOML or JSON)
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Maximum number of records to process; values <= 0 mean no limit
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    total: i64,

    /// Track token cost for backends that report usage
    #[arg(long)]
    calculate_cost: bool,

    /// Write logs to a timestamped file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(&cli.config)?;

    let log_dir = cli.log_dir.clone().or_else(|| settings.log_dir.clone());
    if let Some(path) = init_tracing(log_dir.as_deref())? {
        eprintln!("Logging to {}", path.display());
    }

    let orchestrator = Orchestrator::from_settings(&settings, cli.calculate_cost)?;

    tracing::info!("Data generation started");
    let summary = orchestrator
        .run(RunOptions {
            max_count: max_count_from_sentinel(cli.total),
            show_progress: !cli.no_progress,
        })
        .await?;

    tracing::info!(
        records = summary.records,
        attempted = summary.attempted,
        saved = summary.saved,
        failed_calls = summary.failed_calls,
        failed_writes = summary.failed_writes,
        "Data generation finished"
    );
    if cli.calculate_cost {
        tracing::info!(
            input_tokens = summary.ledger.input_tokens,
            output_tokens = summary.ledger.output_tokens,
            "Total cost: {}",
            summary.ledger.total_cost
        );
    }

    Ok(())
}
