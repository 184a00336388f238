//! Formatting and validation helpers.
//!
//! Formatters keep the diagnostic channel human-readable; validators give
//! configuration errors a clear message before any measurement work starts.

use anyhow::Result;
use std::time::Duration;

/// Format a nanosecond value with an appropriate unit.
pub fn format_duration_ns(ns: u64) -> String {
    format_duration(Duration::from_nanos(ns))
}

/// Format a duration with an appropriate unit.
///
/// Sub-second values use two decimal places; longer durations switch to a
/// compound minutes/seconds form.
pub fn format_duration(duration: Duration) -> String {
    let total_ns = duration.as_nanos();

    if total_ns < 1_000 {
        format!("{}ns", total_ns)
    } else if total_ns < 1_000_000 {
        format!("{:.2}μs", total_ns as f64 / 1_000.0)
    } else if total_ns < 1_000_000_000 {
        format!("{:.2}ms", total_ns as f64 / 1_000_000.0)
    } else if total_ns < 60_000_000_000 {
        format!("{:.2}s", total_ns as f64 / 1_000_000_000.0)
    } else {
        let seconds = duration.as_secs();
        let minutes = seconds / 60;
        let remaining_seconds = seconds % 60;
        format!("{}m {}s", minutes, remaining_seconds)
    }
}

/// Validate the measurement worker count.
///
/// Zero workers would measure nothing; treat it as a configuration error
/// rather than a degenerate no-op.
pub fn validate_threads(threads: usize) -> Result<()> {
    if threads == 0 {
        anyhow::bail!("worker count cannot be zero");
    }
    if threads > 1024 {
        anyhow::bail!("worker count {} is too high (maximum 1024)", threads);
    }
    Ok(())
}

/// Validate the measurement duration in seconds.
pub fn validate_duration_secs(secs: u64) -> Result<()> {
    if secs == 0 {
        anyhow::bail!("measurement duration cannot be zero");
    }
    if secs > 86_400 {
        anyhow::bail!("measurement duration {}s is too long (maximum 24h)", secs);
    }
    Ok(())
}

/// Validate the workload's outer allocation dimension.
pub fn validate_outer_size(outer_size: usize) -> Result<()> {
    if outer_size == 0 {
        anyhow::bail!("workload outer size cannot be zero");
    }
    if outer_size > 100_000 {
        anyhow::bail!(
            "workload outer size {} is too large (maximum 100000)",
            outer_size
        );
    }
    Ok(())
}

/// Number of logical CPU cores available to this process.
pub fn get_cpu_cores() -> usize {
    num_cpus::get()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration_ns() {
        assert_eq!(format_duration_ns(500), "500ns");
        assert_eq!(format_duration_ns(1_500), "1.50μs");
        assert_eq!(format_duration_ns(1_500_000), "1.50ms");
        assert_eq!(format_duration_ns(1_500_000_000), "1.50s");
        assert_eq!(format_duration_ns(90_000_000_000), "1m 30s");
    }

    #[test]
    fn test_validate_threads() {
        assert!(validate_threads(1).is_ok());
        assert!(validate_threads(8).is_ok());
        assert!(validate_threads(0).is_err());
        assert!(validate_threads(1025).is_err());
    }

    #[test]
    fn test_validate_duration_secs() {
        assert!(validate_duration_secs(1).is_ok());
        assert!(validate_duration_secs(30).is_ok());
        assert!(validate_duration_secs(0).is_err());
        assert!(validate_duration_secs(86_401).is_err());
    }

    #[test]
    fn test_validate_outer_size() {
        assert!(validate_outer_size(1).is_ok());
        assert!(validate_outer_size(50).is_ok());
        assert!(validate_outer_size(0).is_err());
        assert!(validate_outer_size(100_001).is_err());
    }

    #[test]
    fn test_get_cpu_cores() {
        assert!(get_cpu_cores() > 0);
    }
}
