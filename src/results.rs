use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

use crate::benchmark::BenchmarkConfig;
use crate::metrics::{LatencyRecorder, LatencySummary};

/// Per-worker latest-result slots.
///
/// One slot per worker ordinal, written only by its owning worker, so slots
/// never contend. Stores are relaxed; the scheduler's join of all workers is
/// the happens-before edge that makes a post-join `snapshot` coherent. The
/// board is diagnostic only: it proves after the fact that no worker starved
/// or crashed silently.
pub struct ResultBoard {
    slots: Vec<WorkerSlot>,
}

struct WorkerSlot {
    last_value: AtomicU64,
    iterations: AtomicU64,
}

impl ResultBoard {
    /// Create a board with one slot per worker.
    pub fn new(workers: usize) -> Self {
        let slots = (0..workers)
            .map(|_| WorkerSlot {
                last_value: AtomicU64::new(0),
                iterations: AtomicU64::new(0),
            })
            .collect();
        Self { slots }
    }

    /// Number of worker slots.
    pub fn workers(&self) -> usize {
        self.slots.len()
    }

    /// Publish the latest workload result for `worker`.
    ///
    /// Must only be called by the worker owning that ordinal.
    pub fn publish(&self, worker: usize, value: u64) {
        let slot = &self.slots[worker];
        slot.last_value.store(value, Ordering::Relaxed);
        slot.iterations.fetch_add(1, Ordering::Relaxed);
    }

    /// Read every slot. Only meaningful after all workers have joined.
    pub fn snapshot(&self) -> Vec<WorkerOutcome> {
        self.slots
            .iter()
            .enumerate()
            .map(|(worker, slot)| {
                let iterations = slot.iterations.load(Ordering::Relaxed);
                WorkerOutcome {
                    worker,
                    iterations,
                    last_value: (iterations > 0).then(|| slot.last_value.load(Ordering::Relaxed)),
                }
            })
            .collect()
    }
}

/// What one worker reported over the whole measurement phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerOutcome {
    pub worker: usize,
    pub iterations: u64,
    /// Most recent workload return value; `None` if the worker never
    /// completed an invocation.
    pub last_value: Option<u64>,
}

/// Structured results document for one benchmark run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkResults {
    pub run_id: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub config: RunConfiguration,
    pub latency: LatencySummary,
    pub workers: Vec<WorkerOutcome>,
    pub system_info: SystemInfo,
}

/// Echo of the configuration the run executed with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfiguration {
    pub duration: Duration,
    pub threads: usize,
    pub outer_size: usize,
    pub warmup_samples: usize,
}

/// Host details for reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os: String,
    pub architecture: String,
    pub cpu_cores: usize,
    pub benchmark_version: String,
}

impl SystemInfo {
    pub fn collect() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            architecture: std::env::consts::ARCH.to_string(),
            cpu_cores: crate::utils::get_cpu_cores(),
            benchmark_version: crate::VERSION.to_string(),
        }
    }
}

impl BenchmarkResults {
    /// Assemble the results document after all workers have joined and before
    /// the recorder is reset.
    pub fn new(
        config: &BenchmarkConfig,
        recorder: &LatencyRecorder,
        workers: Vec<WorkerOutcome>,
    ) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            timestamp: chrono::Utc::now(),
            config: RunConfiguration {
                duration: config.duration,
                threads: config.threads,
                outer_size: config.outer_size,
                warmup_samples: config.warmup_samples,
            },
            latency: recorder.summary(),
            workers,
            system_info: SystemInfo::collect(),
        }
    }
}

/// Writes the results document to its configured output file.
pub struct ResultsManager {
    output_file: PathBuf,
}

impl ResultsManager {
    pub fn new(output_file: &Path) -> Self {
        Self {
            output_file: output_file.to_path_buf(),
        }
    }

    /// Serialize `results` as pretty JSON to the output file.
    pub fn write(&self, results: &BenchmarkResults) -> Result<()> {
        let json = serde_json::to_string_pretty(results)
            .context("failed to serialize benchmark results")?;
        std::fs::write(&self.output_file, json).with_context(|| {
            format!(
                "failed to write results to {}",
                self.output_file.display()
            )
        })?;
        info!("results written to {}", self.output_file.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slots_snapshot_as_none() {
        let board = ResultBoard::new(3);
        let snapshot = board.snapshot();
        assert_eq!(snapshot.len(), 3);
        for outcome in &snapshot {
            assert_eq!(outcome.iterations, 0);
            assert_eq!(outcome.last_value, None);
        }
    }

    #[test]
    fn publish_tracks_latest_value_and_iteration_count() {
        let board = ResultBoard::new(2);
        board.publish(0, 11);
        board.publish(0, 22);
        board.publish(1, 33);

        let snapshot = board.snapshot();
        assert_eq!(snapshot[0].last_value, Some(22));
        assert_eq!(snapshot[0].iterations, 2);
        assert_eq!(snapshot[1].last_value, Some(33));
        assert_eq!(snapshot[1].iterations, 1);
    }

    #[test]
    fn slots_are_partitioned_across_threads() {
        use std::sync::Arc;
        let board = Arc::new(ResultBoard::new(4));
        let handles: Vec<_> = (0..4)
            .map(|worker| {
                let board = Arc::clone(&board);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        board.publish(worker, i);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        for outcome in board.snapshot() {
            assert_eq!(outcome.iterations, 500);
            assert_eq!(outcome.last_value, Some(499));
        }
    }

    #[test]
    fn results_document_round_trips_through_json() {
        let results = BenchmarkResults {
            run_id: "test-run".to_string(),
            timestamp: chrono::Utc::now(),
            config: RunConfiguration {
                duration: Duration::from_secs(30),
                threads: 4,
                outer_size: 50,
                warmup_samples: 15_000,
            },
            latency: crate::metrics::LatencyRecorder::new().unwrap().summary(),
            workers: vec![WorkerOutcome {
                worker: 0,
                iterations: 42,
                last_value: Some(7),
            }],
            system_info: SystemInfo::collect(),
        };

        let json = serde_json::to_string(&results).unwrap();
        let parsed: BenchmarkResults = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.run_id, "test-run");
        assert_eq!(parsed.workers, results.workers);
        assert_eq!(parsed.config.threads, 4);
    }
}
