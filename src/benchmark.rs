//! Benchmark engine: warmup, concurrent measurement, and reporting.
//!
//! The runner drives one complete benchmark lifecycle:
//!
//! 1. **Warmup**: single-threaded invocations until the runtime is in steady
//!    state, fully completed before any measurement.
//! 2. **Measurement**: N independent workers share one deadline and one
//!    latency recorder; each worker times workload invocations in a tight
//!    loop until it observes the deadline.
//! 3. **Reporting**: after every worker has joined, the percentile
//!    distribution goes to stdout and the recorder is reset for reuse.
//!
//! Workers never coordinate with each other. The deadline is a value copied
//! into each worker; cancellation is cooperative, checked only between
//! invocations, so the wall-clock overrun past the deadline is bounded by one
//! invocation's worst-case latency per worker. An optional profiling session
//! brackets exactly the measurement window.

use anyhow::{anyhow, Context, Result};
use std::hint::black_box;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cli::Args;
use crate::defaults;
use crate::metrics::LatencyRecorder;
use crate::recorder::ProfilingRecorder;
use crate::results::{BenchmarkResults, ResultBoard, ResultsManager};
use crate::utils::{
    format_duration, validate_duration_secs, validate_outer_size, validate_threads,
};
use crate::warmup::run_warmup;
use crate::workload::{NestedAllocationWorkload, Workload};

/// Validated configuration for one benchmark run.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Total measurement wall-clock budget.
    pub duration: Duration,

    /// Number of concurrent measurement workers.
    pub threads: usize,

    /// Outer dimension of the nested allocation workload.
    pub outer_size: usize,

    /// Single-threaded warmup invocations before measurement.
    pub warmup_samples: usize,

    /// Dump file for the optional profiling session.
    pub recording: Option<PathBuf>,

    /// Optional JSON results document destination.
    pub output_file: Option<PathBuf>,
}

impl BenchmarkConfig {
    /// Build a validated configuration from parsed arguments.
    ///
    /// All configuration errors are detected here, before any warmup or
    /// measurement work happens.
    pub fn from_args(args: &Args) -> Result<Self> {
        validate_threads(args.threads)?;
        validate_duration_secs(args.duration)?;
        validate_outer_size(args.random_count)?;

        Ok(Self {
            duration: Duration::from_secs(args.duration),
            threads: args.threads,
            outer_size: args.random_count,
            warmup_samples: args.warmup_samples,
            recording: args.perf_recording.clone(),
            output_file: args.output_file.clone(),
        })
    }
}

/// Orchestrates warmup, the concurrent measurement phase, and reporting.
pub struct BenchmarkRunner {
    config: BenchmarkConfig,
    workload: Arc<dyn Workload>,
}

impl BenchmarkRunner {
    /// Create a runner measuring the standard nested-allocation workload.
    pub fn new(config: BenchmarkConfig) -> Self {
        let workload = Arc::new(NestedAllocationWorkload::new(config.outer_size));
        Self { config, workload }
    }

    /// Create a runner measuring a caller-provided workload.
    ///
    /// The engine itself is workload-agnostic; anything timed and
    /// side-effect-free can stand in for the allocation payload.
    pub fn with_workload(config: BenchmarkConfig, workload: Arc<dyn Workload>) -> Self {
        Self { config, workload }
    }

    /// Execute one full benchmark run and return the collected results.
    ///
    /// Any failure is fatal: there is no meaningful partial distribution if a
    /// worker crashed, overran the histogram bounds, or failed to stop.
    pub async fn run(&self) -> Result<BenchmarkResults> {
        info!(
            "measuring for {} across {} workers (outer size {})",
            format_duration(self.config.duration),
            self.config.threads,
            self.config.outer_size
        );

        run_warmup(self.workload.as_ref(), self.config.warmup_samples);

        let recorder = Arc::new(LatencyRecorder::new()?);
        let board = Arc::new(ResultBoard::new(self.config.threads));

        let benchmark_start = Instant::now();
        let deadline = benchmark_start + self.config.duration;

        // The profiling session opens after warmup and closes after the last
        // join, so the capture covers exactly the measured window. Dropping
        // the guard stops the child on every exit path below.
        let session = match &self.config.recording {
            Some(path) => Some(ProfilingRecorder::start(path)?),
            None => None,
        };

        let mut handles = Vec::with_capacity(self.config.threads);
        for worker in 0..self.config.threads {
            let workload = Arc::clone(&self.workload);
            let recorder = Arc::clone(&recorder);
            let board = Arc::clone(&board);
            handles.push(tokio::task::spawn_blocking(move || {
                run_worker(worker, &*workload, deadline, benchmark_start, &recorder, &board)
            }));
        }

        // Workers stop on their own once they observe the deadline; the join
        // is bounded so a stuck worker surfaces as an error instead of
        // hanging the harness.
        let hard_stop = deadline + defaults::JOIN_GRACE;
        for (worker, handle) in handles.into_iter().enumerate() {
            let budget = hard_stop.saturating_duration_since(Instant::now());
            let joined = tokio::time::timeout(budget, handle).await.map_err(|_| {
                anyhow!(
                    "worker {} did not stop within {:?} past the deadline; presumed stuck",
                    worker,
                    defaults::JOIN_GRACE
                )
            })?;
            joined
                .with_context(|| format!("worker {} terminated abnormally", worker))?
                .with_context(|| format!("worker {} failed during measurement", worker))?;
        }
        debug!(
            "all {} workers joined after {}",
            self.config.threads,
            format_duration(benchmark_start.elapsed())
        );

        if let Some(session) = session {
            session.stop()?;
        }

        let outcomes = board.snapshot();
        for outcome in &outcomes {
            info!(
                "worker {}: {} invocations, last result {:?}",
                outcome.worker, outcome.iterations, outcome.last_value
            );
        }

        let results = BenchmarkResults::new(&self.config, &recorder, outcomes);

        // The percentile distribution is the primary output and the only
        // thing written to stdout; everything else goes through the
        // diagnostic channel.
        let report = recorder.percentile_distribution(defaults::OUTPUT_SCALE);
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(report.as_bytes())
            .context("failed to write percentile report")?;
        stdout.flush().context("failed to flush percentile report")?;

        if let Some(path) = &self.config.output_file {
            ResultsManager::new(path).write(&results)?;
        }

        recorder.reset();
        Ok(results)
    }
}

/// One measurement worker: time, record, publish, and log until the deadline.
///
/// The deadline is checked only between invocations; an invocation in flight
/// when it passes always completes and is still recorded.
fn run_worker(
    worker: usize,
    workload: &dyn Workload,
    deadline: Instant,
    benchmark_start: Instant,
    recorder: &LatencyRecorder,
    board: &ResultBoard,
) -> Result<()> {
    let mut last_log = Instant::now();

    loop {
        if Instant::now() >= deadline {
            return Ok(());
        }

        let start = Instant::now();
        let result = black_box(workload.run());
        let sample = start.elapsed();

        recorder.record(sample)?;
        board.publish(worker, result);

        if last_log.elapsed() >= defaults::LIVENESS_INTERVAL {
            info!(
                "worker {} at {}, last sample {}",
                worker,
                format_duration(benchmark_start.elapsed()),
                format_duration(sample)
            );
            last_log = Instant::now();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn args(argv: &[&str]) -> Args {
        let mut full = vec!["alloc-benchmark"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    #[test]
    fn zero_threads_is_a_configuration_error() {
        let err = BenchmarkConfig::from_args(&args(&["--threads", "0"])).unwrap_err();
        assert!(err.to_string().contains("worker count"));
    }

    #[test]
    fn zero_duration_is_a_configuration_error() {
        assert!(BenchmarkConfig::from_args(&args(&["--duration", "0"])).is_err());
    }

    #[test]
    fn zero_outer_size_is_a_configuration_error() {
        assert!(BenchmarkConfig::from_args(&args(&["--random-count", "0"])).is_err());
    }

    #[test]
    fn valid_args_produce_the_expected_config() {
        let config = BenchmarkConfig::from_args(&args(&["--duration", "2", "--threads", "2"]))
            .unwrap();
        assert_eq!(config.duration, Duration::from_secs(2));
        assert_eq!(config.threads, 2);
        assert_eq!(config.outer_size, defaults::OUTER_SIZE);
        assert_eq!(config.warmup_samples, defaults::WARMUP_SAMPLES);
        assert!(config.recording.is_none());
    }
}
