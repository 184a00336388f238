//! Benchmark entry point.
//!
//! Initializes the diagnostic channel, validates configuration, and runs one
//! benchmark lifecycle. Any fatal error propagates out of `main` and produces
//! a non-zero exit status; a report is only ever emitted after a fully
//! successful run.

use anyhow::Result;
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use alloc_benchmark::benchmark::{BenchmarkConfig, BenchmarkRunner};
use alloc_benchmark::cli::Args;
use alloc_benchmark::logging::DiagnosticFormatter;

#[tokio::main]
async fn main() -> Result<()> {
    // All tracing output goes to stderr: stdout is reserved for the
    // percentile distribution report.
    tracing_subscriber::fmt()
        .event_format(DiagnosticFormatter)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    debug!("configuration: {:?}", args);

    let config = BenchmarkConfig::from_args(&args)?;
    let runner = BenchmarkRunner::new(config);
    let results = runner.run().await?;

    info!(
        "run {} complete: {} samples recorded",
        results.run_id, results.latency.total_samples
    );
    Ok(())
}
