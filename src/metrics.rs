use anyhow::{Context, Result};
use hdrhistogram::Histogram;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

use crate::defaults;

/// Thread-safe latency aggregator backed by an HDR histogram.
///
/// A single recorder is shared by every measurement worker. Recording takes a
/// short critical section per sample, which is acceptable because samples
/// arrive once per workload invocation, orders of magnitude less often than
/// the allocations inside the workload itself. The histogram is created once
/// with a fixed maximum trackable value and precision; a sample above the
/// maximum is a configuration error and is reported as such, never clamped.
pub struct LatencyRecorder {
    histogram: Mutex<Histogram<u64>>,
}

impl LatencyRecorder {
    /// Create a recorder tracking values up to one minute with three
    /// significant figures.
    pub fn new() -> Result<Self> {
        let histogram = Histogram::<u64>::new_with_max(
            defaults::MAX_TRACKABLE_NS,
            defaults::SIGNIFICANT_FIGURES,
        )
        .context("failed to create latency histogram")?;
        Ok(Self {
            histogram: Mutex::new(histogram),
        })
    }

    /// Record one execution-duration sample.
    ///
    /// Safe to call concurrently from all workers; no updates are lost. Fails
    /// only when the sample exceeds the maximum trackable value, which is
    /// treated as fatal by callers.
    pub fn record(&self, latency: Duration) -> Result<()> {
        let latency_ns = latency.as_nanos() as u64;
        self.histogram.lock().record(latency_ns).with_context(|| {
            format!(
                "latency sample of {}ns exceeds the maximum trackable value of {}ns",
                latency_ns,
                defaults::MAX_TRACKABLE_NS
            )
        })
    }

    /// Number of samples recorded so far.
    pub fn sample_count(&self) -> u64 {
        self.histogram.lock().len()
    }

    /// Value at the given percentile (0.0 to 100.0), in nanoseconds.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        self.histogram.lock().value_at_percentile(percentile)
    }

    /// Largest recorded value, in nanoseconds.
    pub fn max(&self) -> u64 {
        self.histogram.lock().max()
    }

    /// Arithmetic mean of all recorded values, in nanoseconds.
    pub fn mean(&self) -> f64 {
        self.histogram.lock().mean()
    }

    /// Render the full percentile distribution, values divided by
    /// `output_scale` (e.g. 1,000,000.0 to report nanosecond samples in
    /// milliseconds).
    ///
    /// Only meaningful once all workers have joined; a concurrent `record`
    /// would be excluded or included arbitrarily.
    pub fn percentile_distribution(&self, output_scale: f64) -> String {
        let histogram = self.histogram.lock();
        let mut out = String::new();

        let _ = writeln!(
            out,
            "{:>12} {:>14} {:>10} {:>14}",
            "Value", "Percentile", "TotalCount", "1/(1-Percentile)"
        );
        let _ = writeln!(out);

        let mut total_count: u64 = 0;
        for step in histogram.iter_quantiles(defaults::PERCENTILE_TICKS_PER_HALF_DISTANCE) {
            total_count += step.count_since_last_iteration();
            let value = step.value_iterated_to() as f64 / output_scale;
            let quantile = step.quantile_iterated_to();
            if quantile < 1.0 {
                let _ = writeln!(
                    out,
                    "{:12.3} {:14.12} {:10} {:14.2}",
                    value,
                    quantile,
                    total_count,
                    1.0 / (1.0 - quantile)
                );
            } else {
                let _ = writeln!(out, "{:12.3} {:14.12} {:10}", value, quantile, total_count);
            }
        }

        let _ = writeln!(
            out,
            "#[Mean    = {:12.3}, StdDeviation   = {:12.3}]",
            histogram.mean() / output_scale,
            histogram.stdev() / output_scale
        );
        let _ = writeln!(
            out,
            "#[Max     = {:12.3}, Total count    = {:12}]",
            histogram.max() as f64 / output_scale,
            histogram.len()
        );

        out
    }

    /// Summarize the distribution for the structured results document.
    pub fn summary(&self) -> LatencySummary {
        let histogram = self.histogram.lock();
        LatencySummary {
            p50_ns: histogram.value_at_percentile(50.0),
            p90_ns: histogram.value_at_percentile(90.0),
            p99_ns: histogram.value_at_percentile(99.0),
            p999_ns: histogram.value_at_percentile(99.9),
            max_ns: histogram.max(),
            mean_ns: histogram.mean(),
            total_samples: histogram.len(),
        }
    }

    /// Discard all recorded data so the recorder can serve a subsequent run.
    ///
    /// Destructive; must not be called while any worker may still record.
    pub fn reset(&self) {
        self.histogram.lock().reset();
    }
}

/// Percentile summary of a completed run, in nanoseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencySummary {
    pub p50_ns: u64,
    pub p90_ns: u64,
    pub p99_ns: u64,
    pub p999_ns: u64,
    pub max_ns: u64,
    pub mean_ns: f64,
    pub total_samples: u64,
}
