use std::path::PathBuf;

use clap::Parser;

use bench_harness::config::SuiteConfig;
use bench_harness::run_benchmark;
use bench_harness::ui::report::OutputFormat;
use bench_harness::utils::logging::init_logging;
use bench_harness::BenchError;

#[derive(Parser)]
#[command(name = "bench_harness")]
#[command(about = "Measure wall-clock time of repeated, captured and concurrent work")]
#[command(version)]
struct Cli {
    /// Suite file (JSON); the built-in demo suite runs when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the repetition count of every case
    #[arg(long, allow_negative_numbers = true)]
    runs: Option<i64>,

    /// Layout of the results section
    #[arg(long, value_enum, default_value = "table")]
    format: OutputFormat,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

async fn run(cli: Cli) -> Result<(), BenchError> {
    let mut config = match &cli.config {
        Some(path) => SuiteConfig::load(path)?,
        None => SuiteConfig::default(),
    };
    init_logging(&config.log, cli.verbose)?;
    tracing::info!(cases = config.cases.len(), "suite configuration ready");

    if let Some(runs) = cli.runs {
        config.override_runs(runs);
    }

    run_benchmark(&config, cli.format).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Fatal error: {}", e);
        std::process::exit(1);
    }
}
