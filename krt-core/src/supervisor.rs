//! Target process lifecycle: spawn as a process-group leader, tear down the
//! whole group.
//!
//! The launch command is opaque; it is handed to `sh -c` with stdout piped
//! and made the leader of a fresh process group, so the target and any
//! children it spawns (an emulator, a build step) can be reclaimed as one
//! unit. Group signalling goes through `kill(1)` rather than a raw syscall,
//! which keeps the crate free of unsafe code.
//!
//! Teardown is guaranteed on every exit path: the normal path calls
//! [`Target::terminate`] (SIGTERM, bounded grace, then SIGKILL), and the
//! `Drop` guard force-kills the group if verification unwinds first.

use crate::error::VerifyError;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, warn};

/// Grace period between SIGTERM and SIGKILL escalation.
const TERM_GRACE: Duration = Duration::from_secs(2);

/// A live target process group.
pub struct Target {
    child: Child,
    /// Process-group id; equals the leader's pid. 0 means unknown.
    pgid: u32,
    terminated: bool,
}

impl Target {
    /// Launch the command in its own process group with stdout captured.
    pub fn spawn(command: &str) -> Result<Self, VerifyError> {
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true);

        let child = cmd.spawn()?;
        let pgid = child.id().unwrap_or(0);
        debug!(pgid, %command, "target launched");

        Ok(Self {
            child,
            pgid,
            terminated: false,
        })
    }

    /// Take ownership of the captured stdout handle. Present exactly once.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Terminate the whole process group: SIGTERM, wait out the grace
    /// period, escalate to SIGKILL if the leader is still alive.
    pub async fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        signal_group(self.pgid, "TERM");
        match tokio::time::timeout(TERM_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => debug!(pgid = self.pgid, ?status, "target group terminated"),
            Ok(Err(e)) => warn!(pgid = self.pgid, "failed to reap target: {e}"),
            Err(_) => {
                warn!(pgid = self.pgid, "target ignored SIGTERM, escalating to SIGKILL");
                signal_group(self.pgid, "KILL");
                let _ = self.child.wait().await;
            }
        }
    }
}

impl Drop for Target {
    fn drop(&mut self) {
        // Backstop for panics and early returns; the normal path has
        // already gone through terminate() and reaped the leader.
        if !self.terminated {
            signal_group(self.pgid, "KILL");
        }
    }
}

/// Signal an entire process group via `kill(1)`. Returns whether the
/// signal was delivered.
fn signal_group(pgid: u32, signal: &str) -> bool {
    if pgid == 0 {
        return false;
    }
    std::process::Command::new("kill")
        .args(["-s", signal, "--", &format!("-{pgid}")])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_captures_stdout_once() {
        let mut target = Target::spawn("echo hello").unwrap();
        assert!(target.take_stdout().is_some());
        assert!(target.take_stdout().is_none());
        target.terminate().await;
    }

    #[tokio::test]
    async fn test_terminate_reaps_a_sleeping_group() {
        let mut target = Target::spawn("sleep 30").unwrap();
        let pgid = target.pgid;
        assert!(pgid != 0);
        target.terminate().await;
        // terminate() reaps the leader; orphaned children linger as
        // signalable group members until the init process collects them,
        // so poll for group disappearance rather than demanding it
        // instantly.
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while signal_group(pgid, "TERM") {
            assert!(
                std::time::Instant::now() < deadline,
                "process group {pgid} still signalable after terminate"
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let mut target = Target::spawn("true").unwrap();
        target.terminate().await;
        target.terminate().await;
    }

    #[test]
    fn test_signal_group_rejects_unknown_pgid() {
        assert!(!signal_group(0, "TERM"));
    }
}
