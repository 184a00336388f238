use clap::Parser;
use std::path::PathBuf;

use crate::defaults;

/// Allocation-churn latency benchmark.
///
/// Measures the latency distribution of an allocation-heavy workload under
/// concurrent execution, after a single-threaded warmup has driven the
/// runtime to steady state. Every option is also readable from the
/// environment so the harness can run unmodified inside batch jobs and
/// containers; a command-line flag overrides its environment variable.
#[derive(Parser, Debug, Clone)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Measurement wall-clock budget in seconds
    #[clap(short = 'd', long, env = "DURATION", default_value_t = defaults::DURATION_SECS)]
    pub duration: u64,

    /// Number of concurrent measurement workers
    #[clap(short = 't', long, env = "THREADS", default_value_t = defaults::THREADS)]
    pub threads: usize,

    /// Outer dimension of the nested allocation workload
    #[clap(long, env = "RANDOM_COUNT", default_value_t = defaults::OUTER_SIZE)]
    pub random_count: usize,

    /// Number of single-threaded warmup invocations before measurement
    #[clap(short = 'w', long, env = "WARMUP_SAMPLES", default_value_t = defaults::WARMUP_SAMPLES)]
    pub warmup_samples: usize,

    /// Attach `perf record` around the measurement phase, dumping to this file
    #[clap(long, env = "PERF_RECORDING")]
    pub perf_recording: Option<PathBuf>,

    /// Write a JSON results document to this file after the run
    #[clap(short = 'o', long, env = "OUTPUT_FILE")]
    pub output_file: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_configuration() {
        let args = Args::try_parse_from(["alloc-benchmark"]).unwrap();
        assert_eq!(args.duration, 30);
        assert_eq!(args.threads, 4);
        assert_eq!(args.random_count, 50);
        assert_eq!(args.warmup_samples, 15_000);
        assert!(args.perf_recording.is_none());
        assert!(args.output_file.is_none());
    }

    #[test]
    fn flags_override_defaults() {
        let args = Args::try_parse_from([
            "alloc-benchmark",
            "--duration",
            "2",
            "--threads",
            "2",
            "--random-count",
            "10",
            "-w",
            "100",
            "-o",
            "results.json",
        ])
        .unwrap();
        assert_eq!(args.duration, 2);
        assert_eq!(args.threads, 2);
        assert_eq!(args.random_count, 10);
        assert_eq!(args.warmup_samples, 100);
        assert_eq!(args.output_file, Some(PathBuf::from("results.json")));
    }

    #[test]
    fn non_numeric_duration_is_rejected() {
        assert!(Args::try_parse_from(["alloc-benchmark", "--duration", "soon"]).is_err());
    }
}
