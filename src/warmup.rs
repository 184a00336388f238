//! Single-threaded warmup phase.
//!
//! The measurement phase only produces a meaningful distribution once the
//! allocator and runtime have reached steady state, so the harness drives the
//! workload through a fixed number of untimed, single-threaded invocations
//! first. Nothing from this phase touches the measurement histogram.

use rand::Rng;
use std::hint::black_box;
use std::time::Instant;
use tracing::{debug, info};

use crate::defaults;
use crate::utils::format_duration;
use crate::workload::Workload;

/// Execute the workload exactly `samples` times before measurement starts.
///
/// Every return value is retained in a flat vector so the optimizer cannot
/// elide the invocations; once the loop finishes, one retained value is picked
/// at random and returned for diagnostic logging. Emits a progress line at
/// most once per second of wall-clock time. Returns `None` when `samples` is
/// zero. A panicking workload propagates; the harness has no defined behavior
/// for a workload that fails during warmup.
pub fn run_warmup(workload: &dyn Workload, samples: usize) -> Option<u64> {
    if samples == 0 {
        debug!("warmup skipped (zero samples configured)");
        return None;
    }

    let start = Instant::now();
    info!("warmup ({} samples) starting", samples);

    let mut retained = Vec::with_capacity(samples);
    let mut last_log = Instant::now();
    for i in 0..samples {
        retained.push(black_box(workload.run()));

        if last_log.elapsed() >= defaults::LIVENESS_INTERVAL {
            info!(
                "warmup progress: {}/{} after {}",
                i + 1,
                samples,
                format_duration(start.elapsed())
            );
            last_log = Instant::now();
        }
    }

    let pick = retained[rand::thread_rng().gen_range(0..retained.len())];
    info!("warmup diagnostic value: {}", pick);
    info!("warmup complete in {}", format_duration(start.elapsed()));

    Some(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::LatencyRecorder;
    use crate::workload::CountingWorkload;

    #[test]
    fn runs_exactly_the_configured_number_of_invocations() {
        let workload = CountingWorkload::new();
        let pick = run_warmup(&workload, 257);
        assert_eq!(workload.invocations(), 257);
        // The diagnostic pick is one of the retained counter values.
        let pick = pick.unwrap();
        assert!(pick >= 1 && pick <= 257);
    }

    #[test]
    fn zero_samples_is_a_no_op() {
        let workload = CountingWorkload::new();
        assert_eq!(run_warmup(&workload, 0), None);
        assert_eq!(workload.invocations(), 0);
    }

    #[test]
    fn warmup_never_writes_to_the_measurement_histogram() {
        // The recorder is created alongside the warmup exactly as the runner
        // does it; the warmup has no path to it.
        let recorder = LatencyRecorder::new().unwrap();
        let workload = CountingWorkload::new();
        run_warmup(&workload, 100);
        assert_eq!(recorder.sample_count(), 0);
    }
}
