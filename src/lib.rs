//! # Allocation-Churn Latency Benchmark
//!
//! A microbenchmark harness that measures the latency distribution of an
//! allocation-heavy workload under sustained concurrent execution, once the
//! runtime has been warmed into steady state. It exists for engineers
//! studying allocator behavior under parallel churn of short-lived objects.
//!
//! ## Architecture Overview
//!
//! - `workload`: the pluggable timed payload (nested random-number
//!   allocations by default)
//! - `warmup`: single-threaded steady-state warmup that runs to completion
//!   before any measurement
//! - `benchmark`: the concurrent scheduler driving N workers against a shared
//!   deadline and a shared latency recorder
//! - `metrics`: thread-safe HDR-histogram aggregation and percentile
//!   reporting
//! - `results`: per-worker result slots plus the structured results document
//! - `recorder`: optional `perf record` session bracketing the measured
//!   window
//! - `cli`: environment-backed command-line configuration
//! - `logging` / `utils`: diagnostic-channel formatting and validation
//!   helpers
//!
//! ## Output Channels
//!
//! The percentile distribution is the primary output and the only thing
//! written to stdout. Liveness lines, warmup progress, and the per-worker
//! result dump are diagnostics and flow through `tracing` to stderr.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use alloc_benchmark::benchmark::{BenchmarkConfig, BenchmarkRunner};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = BenchmarkConfig {
//!         duration: Duration::from_secs(30),
//!         threads: 4,
//!         outer_size: 50,
//!         warmup_samples: 15_000,
//!         recording: None,
//!         output_file: None,
//!     };
//!     let results = BenchmarkRunner::new(config).run().await?;
//!     println!("{} samples recorded", results.latency.total_samples);
//!     Ok(())
//! }
//! ```

pub mod benchmark;
pub mod cli;
pub mod logging;
pub mod metrics;
pub mod recorder;
pub mod results;
pub mod utils;
pub mod warmup;
pub mod workload;

pub use benchmark::{BenchmarkConfig, BenchmarkRunner};
pub use cli::Args;
pub use metrics::{LatencyRecorder, LatencySummary};
pub use results::{BenchmarkResults, ResultBoard};
pub use workload::{NestedAllocationWorkload, Workload};

/// Crate version, embedded in the results document for reproducibility.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration values and fixed harness constants.
pub mod defaults {
    use std::time::Duration;

    /// Default measurement budget in seconds.
    pub const DURATION_SECS: u64 = 30;

    /// Default number of concurrent measurement workers.
    pub const THREADS: usize = 4;

    /// Default outer dimension of the nested allocation workload.
    pub const OUTER_SIZE: usize = 50;

    /// Inner dimension of the nested allocation workload.
    ///
    /// Fixed rather than configurable: the workload's churn profile is
    /// defined by its outer dimension, and varying both would make runs
    /// incomparable.
    pub const INNER_SIZE: usize = 1000;

    /// Default number of single-threaded warmup invocations.
    ///
    /// Enough to carry the allocator well past its cold-start behavior for
    /// this workload shape; measurement duration does not change it.
    pub const WARMUP_SAMPLES: usize = 15_000;

    /// Maximum trackable latency sample: one minute, in nanoseconds.
    ///
    /// Safely above any plausible single-invocation latency; a sample beyond
    /// this is evidence of a misconfigured workload, not a value to track.
    pub const MAX_TRACKABLE_NS: u64 = 60_000_000_000;

    /// Histogram precision in significant figures.
    pub const SIGNIFICANT_FIGURES: u8 = 3;

    /// Scale divisor applied to the stdout report (nanoseconds to
    /// milliseconds).
    pub const OUTPUT_SCALE: f64 = 1_000_000.0;

    /// Resolution of the percentile distribution report.
    pub const PERCENTILE_TICKS_PER_HALF_DISTANCE: u32 = 5;

    /// How long past the nominal deadline the scheduler waits for workers
    /// before declaring one stuck.
    pub const JOIN_GRACE: Duration = Duration::from_secs(60);

    /// Minimum spacing between liveness lines, per worker and during warmup.
    pub const LIVENESS_INTERVAL: Duration = Duration::from_secs(1);
}
