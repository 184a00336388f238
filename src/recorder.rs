//! Optional profiling session bracketing the measurement phase.
//!
//! When a recording path is configured, the harness attaches `perf record` to
//! its own process immediately before the workers launch and detaches it
//! immediately after they all join, so the capture covers exactly the
//! measured window. The session is a scoped resource: dropping it stops the
//! child even on fatal exit paths.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use tracing::{info, warn};

/// A running `perf record` session attached to this process.
pub struct ProfilingRecorder {
    child: Option<Child>,
    output: PathBuf,
}

impl ProfilingRecorder {
    /// Whether the `perf` tool can be invoked at all.
    pub fn is_available() -> bool {
        Command::new("perf")
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Start recording the current process, dumping to `output`.
    ///
    /// Must be called once per run, before any measurement worker starts. A
    /// missing `perf` binary is a startup error surfaced before measurement,
    /// not a condition to degrade around.
    pub fn start(output: &Path) -> Result<Self> {
        if !Self::is_available() {
            bail!("profiling recording was requested but `perf` is not available on PATH");
        }

        let pid = std::process::id();
        let child = Command::new("perf")
            .arg("record")
            .arg("-p")
            .arg(pid.to_string())
            .arg("-o")
            .arg(output)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .context("failed to start perf record")?;

        // Give perf time to attach before the measured window opens.
        std::thread::sleep(Duration::from_millis(100));

        info!("profiling session started, dump file {}", output.display());
        Ok(Self {
            child: Some(child),
            output: output.to_path_buf(),
        })
    }

    /// Stop the session and finalize the dump file.
    pub fn stop(mut self) -> Result<()> {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        // perf only finalizes its output on a graceful termination signal;
        // SIGKILL would leave a truncated dump.
        if child
            .try_wait()
            .context("failed to poll perf record status")?
            .is_none()
        {
            terminate(&child)?;
        }

        let status = child
            .wait()
            .context("failed to collect perf record exit status")?;
        if status.success() {
            info!("profiling session stopped, dump at {}", self.output.display());
        } else {
            warn!(
                "perf record exited with {} while dumping to {}",
                status,
                self.output.display()
            );
        }
        Ok(())
    }
}

impl Drop for ProfilingRecorder {
    fn drop(&mut self) {
        if self.child.is_some() {
            if let Err(e) = self.stop_inner() {
                warn!("failed to stop profiling session: {:#}", e);
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn terminate(child: &Child) -> Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    kill(Pid::from_raw(child.id() as i32), Signal::SIGTERM)
        .context("failed to signal perf record to stop")?;
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn terminate(_child: &Child) -> Result<()> {
    bail!("profiling recording is only supported on Linux");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_fails_when_perf_is_missing() {
        if ProfilingRecorder::is_available() {
            // Covered by the bracketing test on hosts that have perf.
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        assert!(ProfilingRecorder::start(&dir.path().join("perf.data")).is_err());
    }

    #[test]
    fn session_brackets_and_stops_cleanly() {
        if !ProfilingRecorder::is_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let dump = dir.path().join("perf.data");
        let session = ProfilingRecorder::start(&dump).unwrap();
        std::thread::sleep(Duration::from_millis(50));
        session.stop().unwrap();
    }
}
