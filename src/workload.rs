//! Pluggable benchmark workloads.
//!
//! A workload is the single timed unit of work whose latency distribution the
//! harness measures. Implementations must be stateless (or manage their own
//! thread-local state) so that every measurement worker can invoke the same
//! instance concurrently. The return value exists only so callers can feed it
//! through `std::hint::black_box` and keep the optimizer from discarding the
//! computation.

use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::defaults;

/// A timed, side-effect-free unit of work.
///
/// Invoked repeatedly from multiple workers at once; implementations must be
/// safe to share behind an `Arc` without external synchronization.
pub trait Workload: Send + Sync {
    /// Execute one invocation and return a value derived from the work done.
    fn run(&self) -> u64;
}

/// Allocation-churn workload: builds a nested sequence of random numbers.
///
/// Each invocation allocates `outer_size` vectors of `inner_size` random
/// `u64`s and returns one element picked at random. The short-lived nested
/// allocations are the point: the harness exists to observe how the allocator
/// and runtime behave under sustained churn of exactly this shape.
pub struct NestedAllocationWorkload {
    outer_size: usize,
    inner_size: usize,
}

impl NestedAllocationWorkload {
    /// Create a workload with the given outer dimension and the default
    /// inner dimension.
    pub fn new(outer_size: usize) -> Self {
        Self {
            outer_size,
            inner_size: defaults::INNER_SIZE,
        }
    }

    /// Create a workload with explicit outer and inner dimensions.
    pub fn with_inner_size(outer_size: usize, inner_size: usize) -> Self {
        Self {
            outer_size,
            inner_size,
        }
    }

    /// Approximate number of bytes allocated per invocation.
    pub fn bytes_per_invocation(&self) -> usize {
        self.outer_size * self.inner_size * std::mem::size_of::<u64>()
    }
}

impl Workload for NestedAllocationWorkload {
    fn run(&self) -> u64 {
        let mut rng = rand::thread_rng();

        let mut randoms: Vec<Vec<u64>> = Vec::with_capacity(self.outer_size);
        for _ in 0..self.outer_size {
            let mut inner = Vec::with_capacity(self.inner_size);
            for _ in 0..self.inner_size {
                inner.push(rng.gen());
            }
            randoms.push(inner);
        }

        randoms[rng.gen_range(0..self.outer_size)][rng.gen_range(0..self.inner_size)]
    }
}

/// Deterministic workload returning a monotonically increasing counter.
///
/// Used to exercise the harness itself: the counter proves how many
/// invocations happened, and the optional fixed cost gives tests a known
/// per-invocation latency to check throughput and percentiles against.
pub struct CountingWorkload {
    counter: AtomicU64,
    cost: Option<Duration>,
}

impl CountingWorkload {
    /// A counter workload with effectively zero per-invocation cost.
    pub fn new() -> Self {
        Self {
            counter: AtomicU64::new(0),
            cost: None,
        }
    }

    /// A counter workload that sleeps for `cost` on every invocation.
    pub fn with_cost(cost: Duration) -> Self {
        Self {
            counter: AtomicU64::new(0),
            cost: Some(cost),
        }
    }

    /// Total invocations so far, across warmup and measurement.
    pub fn invocations(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

impl Default for CountingWorkload {
    fn default() -> Self {
        Self::new()
    }
}

impl Workload for CountingWorkload {
    fn run(&self) -> u64 {
        if let Some(cost) = self.cost {
            std::thread::sleep(cost);
        }
        self.counter.fetch_add(1, Ordering::Relaxed) + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn nested_allocation_returns_some_element() {
        let workload = NestedAllocationWorkload::with_inner_size(4, 16);
        // Nothing to assert about the value itself, only that invocation
        // completes for a small shape and the sizing math holds.
        let _ = workload.run();
        assert_eq!(workload.bytes_per_invocation(), 4 * 16 * 8);
    }

    #[test]
    fn counting_workload_counts_every_invocation() {
        let workload = CountingWorkload::new();
        for expected in 1..=10 {
            assert_eq!(workload.run(), expected);
        }
        assert_eq!(workload.invocations(), 10);
    }

    #[test]
    fn counting_workload_is_shareable_across_threads() {
        let workload = Arc::new(CountingWorkload::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let workload = Arc::clone(&workload);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        workload.run();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(workload.invocations(), 400);
    }
}
