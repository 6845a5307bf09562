//! One-run orchestration.
//!
//! Builds the strategy for the configured discipline, runs its pre-flight
//! checks, launches the target, drives the sequencer over the line queue,
//! and tears the process group down on every exit path. Configuration
//! problems surface as errors before anything is launched; everything that
//! happens from pre-flight on is folded into the [`RunVerdict`].

use crate::assemble::default_sequence;
use crate::config::{Mode, RunConfig};
use crate::conflict::find_conflict;
use crate::error::{ConfigError, VerifyError};
use crate::reader::spawn_reader;
use crate::sequencer::{KeywordLatch, Ordered, RunVerdict, UnorderedRemoval, drive};
use crate::supervisor::Target;
use std::io;
use tracing::{debug, info};

/// Execute one verification run end to end.
pub async fn run(config: &RunConfig) -> Result<RunVerdict, ConfigError> {
    config.validate()?;

    match config.mode {
        Mode::Ordered => {
            let sequence = default_sequence(&config.arch)?;
            if sequence.is_empty() {
                // Nothing declared, nothing to launch.
                return Ok(RunVerdict::Pass { matched: 0 });
            }
            info!(
                cases = sequence.cases().len(),
                entries = sequence.entry_count(),
                arch = %config.arch,
                "verifying ordered boot sequence"
            );
            Ok(execute(config, Ordered::new(sequence)).await)
        }
        Mode::Unordered => {
            // Ambiguous sets are rejected before the target ever starts.
            if let Some((first, second)) = find_conflict(&config.expected) {
                return Ok(RunVerdict::Fail {
                    error: VerifyError::Conflict {
                        first: first.to_string(),
                        second: second.to_string(),
                    },
                });
            }
            info!(
                literals = config.expected.len(),
                "verifying unordered expectation set"
            );
            let strategy =
                UnorderedRemoval::new(config.expected.clone(), config.failure_marker.clone());
            Ok(execute(config, strategy).await)
        }
        Mode::Latch => {
            info!(
                success = %config.success_marker,
                failure = %config.failure_marker,
                "watching for terminal markers"
            );
            let strategy = KeywordLatch::new(
                config.success_marker.clone(),
                config.failure_marker.clone(),
                config.max_empty_reads,
            );
            Ok(execute(config, strategy).await)
        }
    }
}

/// Launch, verify, tear down. The `Drop` guard on [`Target`] covers the
/// paths this function cannot reach normally (panics in strategies).
async fn execute<S: crate::sequencer::MatchStrategy>(
    config: &RunConfig,
    mut strategy: S,
) -> RunVerdict {
    let mut target = match Target::spawn(&config.command) {
        Ok(target) => target,
        Err(error) => return RunVerdict::Fail { error },
    };

    let verdict = match target.take_stdout() {
        Some(stdout) => {
            let mut queue = spawn_reader(stdout);
            drive(&mut strategy, &mut queue, config.line_timeout).await
        }
        None => RunVerdict::Fail {
            error: VerifyError::Spawn(io::Error::other("target stdout was not captured")),
        },
    };

    target.terminate().await;
    debug!(pass = verdict.is_pass(), "run complete");
    verdict
}
