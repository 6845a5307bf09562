//! The verification engine: one driver loop, three matching disciplines.
//!
//! The driver consumes the line queue in arrival order under a per-line
//! wait bound and delegates every decision to a [`MatchStrategy`]: given an
//! incoming line and its own mutable state, a strategy decides whether the
//! run advances, completes, or fails. The strategy never sees the queue and
//! the driver never sees the expectations, so the three disciplines share
//! one timeout and teardown path instead of three near-duplicate loops.
//!
//! All disciplines are fail-fast: the first mismatch, fault, or expired
//! wait ends the run. The driver never backtracks and never re-reads a
//! line.

use crate::error::VerifyError;
use crate::model::{ExpectedEntry, ExpectedSequence, TestCase};
use crate::reader::LineQueue;
use std::time::Duration;
use tokio::time::timeout;
use tracing::info;

// ── Verdict ──────────────────────────────────────────────────────────────

/// Outcome of one verification run.
#[derive(Debug)]
pub enum RunVerdict {
    /// Every expectation was satisfied.
    Pass { matched: usize },
    /// Verification ended at the first fatal failure.
    Fail { error: VerifyError },
}

impl RunVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, RunVerdict::Pass { .. })
    }
}

// ── Strategy seam ────────────────────────────────────────────────────────

/// A matching discipline, fed one trimmed line at a time by the driver.
pub trait MatchStrategy {
    /// Consume one line. `Ok(true)` means verification is complete;
    /// `Ok(false)` means keep reading; any error is fatal.
    fn on_line(&mut self, line: &str) -> Result<bool, VerifyError>;

    /// One bounded queue wait expired. `Some(err)` aborts the run; `None`
    /// keeps waiting (only the latch discipline tolerates empty reads).
    fn on_timeout(&mut self) -> Option<VerifyError>;

    /// The stream closed with verification incomplete.
    fn on_stream_closed(&mut self) -> VerifyError;

    /// True once every expectation has been satisfied.
    fn is_complete(&self) -> bool;

    /// Number of expectations satisfied so far.
    fn matched(&self) -> usize;
}

/// Drive a strategy over the queue until it completes or fails.
///
/// Every wait is individually bounded by `line_timeout`; a closed queue
/// (end of stream) with expectations outstanding is fatal.
pub async fn drive<S: MatchStrategy>(
    strategy: &mut S,
    queue: &mut LineQueue,
    line_timeout: Duration,
) -> RunVerdict {
    loop {
        if strategy.is_complete() {
            return RunVerdict::Pass {
                matched: strategy.matched(),
            };
        }
        match timeout(line_timeout, queue.recv()).await {
            Ok(Some(line)) => match strategy.on_line(line.trim()) {
                Ok(true) => {
                    return RunVerdict::Pass {
                        matched: strategy.matched(),
                    };
                }
                Ok(false) => {}
                Err(error) => return RunVerdict::Fail { error },
            },
            Ok(None) => {
                return RunVerdict::Fail {
                    error: strategy.on_stream_closed(),
                };
            }
            Err(_) => {
                if let Some(error) = strategy.on_timeout() {
                    return RunVerdict::Fail { error };
                }
            }
        }
    }
}

// ── Ordered discipline ───────────────────────────────────────────────────

/// Strict, ordered, exactly-one-line-per-entry verification.
///
/// Assumes deterministic target output with no unrelated interleaved noise:
/// each incoming line must fully match the current expected entry, any
/// mismatch is fatal at exactly that entry's position.
pub struct Ordered {
    sequence: ExpectedSequence,
    case_idx: usize,
    entry_idx: usize,
    matched: usize,
}

impl Ordered {
    pub fn new(sequence: ExpectedSequence) -> Self {
        Self {
            sequence,
            case_idx: 0,
            entry_idx: 0,
            matched: 0,
        }
    }

    fn current(&self) -> Option<(&TestCase, &ExpectedEntry)> {
        let case = self.sequence.cases().get(self.case_idx)?;
        case.entries().get(self.entry_idx).map(|entry| (case, entry))
    }

    fn advance(&mut self) {
        self.matched += 1;
        self.entry_idx += 1;
        while let Some(case) = self.sequence.cases().get(self.case_idx) {
            if self.entry_idx < case.entries().len() {
                break;
            }
            self.case_idx += 1;
            self.entry_idx = 0;
        }
    }
}

impl MatchStrategy for Ordered {
    fn on_line(&mut self, line: &str) -> Result<bool, VerifyError> {
        let Some((case, entry)) = self.current() else {
            return Ok(true);
        };
        if entry.matches(line)? {
            info!(
                "PASS: {} #{}, expected '{}', found '{}'",
                case.name(),
                self.entry_idx + 1,
                entry.expected_text(),
                line
            );
            self.advance();
            Ok(self.is_complete())
        } else {
            Err(VerifyError::Mismatch {
                case: case.name().to_string(),
                index: self.entry_idx + 1,
                expected: entry.expected_text(),
                found: line.to_string(),
            })
        }
    }

    fn on_timeout(&mut self) -> Option<VerifyError> {
        self.current().map(|(case, entry)| VerifyError::Timeout {
            case: case.name().to_string(),
            index: self.entry_idx + 1,
            expected: entry.expected_text(),
        })
    }

    fn on_stream_closed(&mut self) -> VerifyError {
        self.on_timeout().unwrap_or(VerifyError::AbruptExit)
    }

    fn is_complete(&self) -> bool {
        self.current().is_none()
    }

    fn matched(&self) -> usize {
        self.matched
    }
}

// ── Unordered-removal discipline ─────────────────────────────────────────

/// Tolerant verification for interleaved or annotated output: every
/// expected literal that is a substring of an incoming line is removed from
/// the outstanding set, and the run passes once the set is empty. A line
/// carrying the failure marker is fatal regardless of how much of the set
/// remains. Requires a conflict-free literal set (see [`crate::conflict`]).
pub struct UnorderedRemoval {
    remaining: Vec<String>,
    failure_marker: String,
    matched: usize,
}

impl UnorderedRemoval {
    pub fn new(expected: Vec<String>, failure_marker: impl Into<String>) -> Self {
        Self {
            remaining: expected,
            failure_marker: failure_marker.into(),
            matched: 0,
        }
    }
}

impl MatchStrategy for UnorderedRemoval {
    fn on_line(&mut self, line: &str) -> Result<bool, VerifyError> {
        if line.contains(&self.failure_marker) {
            return Err(VerifyError::TargetFault {
                line: line.to_string(),
            });
        }
        let before = self.remaining.len();
        self.remaining.retain(|literal| {
            let satisfied = line.contains(literal.as_str());
            if satisfied {
                info!("PASS: matched '{literal}' in '{line}'");
            }
            !satisfied
        });
        self.matched += before - self.remaining.len();
        Ok(self.remaining.is_empty())
    }

    fn on_timeout(&mut self) -> Option<VerifyError> {
        Some(VerifyError::Outstanding {
            remaining: self.remaining.clone(),
        })
    }

    fn on_stream_closed(&mut self) -> VerifyError {
        VerifyError::Outstanding {
            remaining: self.remaining.clone(),
        }
    }

    fn is_complete(&self) -> bool {
        self.remaining.is_empty()
    }

    fn matched(&self) -> usize {
        self.matched
    }
}

// ── Keyword-latch discipline ─────────────────────────────────────────────

/// Coarse smoke-test verification: no ordering model, just a terminal
/// success or failure marker. Trades precision for robustness against
/// nondeterministic output.
pub struct KeywordLatch {
    success_marker: String,
    failure_marker: String,
    max_empty_reads: u32,
    empty_reads: u32,
    latched: bool,
}

impl KeywordLatch {
    pub fn new(
        success_marker: impl Into<String>,
        failure_marker: impl Into<String>,
        max_empty_reads: u32,
    ) -> Self {
        Self {
            success_marker: success_marker.into(),
            failure_marker: failure_marker.into(),
            max_empty_reads,
            empty_reads: 0,
            latched: false,
        }
    }
}

impl MatchStrategy for KeywordLatch {
    fn on_line(&mut self, line: &str) -> Result<bool, VerifyError> {
        self.empty_reads = 0;
        if line.contains(&self.failure_marker) {
            return Err(VerifyError::TargetFault {
                line: line.to_string(),
            });
        }
        if line.contains(&self.success_marker) {
            info!("PASS: observed success marker in '{line}'");
            self.latched = true;
        }
        Ok(self.latched)
    }

    fn on_timeout(&mut self) -> Option<VerifyError> {
        self.empty_reads += 1;
        (self.empty_reads >= self.max_empty_reads).then(|| VerifyError::MarkerTimeout {
            reads: self.empty_reads,
        })
    }

    fn on_stream_closed(&mut self) -> VerifyError {
        // An abrupt exit without a marker is a crash indicator in its own
        // right, not a timeout.
        VerifyError::AbruptExit
    }

    fn is_complete(&self) -> bool {
        self.latched
    }

    fn matched(&self) -> usize {
        usize::from(self.latched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Level, TestCase};
    use tokio::sync::mpsc;

    const TICK: Duration = Duration::from_millis(50);

    fn sequence(cases: &[(&str, &[&str])]) -> ExpectedSequence {
        ExpectedSequence::new(
            cases
                .iter()
                .map(|(name, patterns)| TestCase::from_patterns(*name, patterns, Level::Info))
                .collect(),
        )
    }

    fn feed(lines: &[&str]) -> LineQueue {
        let (tx, rx) = mpsc::unbounded_channel();
        for line in lines {
            tx.send(line.to_string()).unwrap();
        }
        // Dropping tx closes the queue, marking end of stream.
        rx
    }

    #[tokio::test]
    async fn test_ordered_passes_on_exact_stream() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt", "Done"])]));
        let mut queue = feed(&["[INFO] Init gdt", "[INFO] Done"]);

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        assert!(verdict.is_pass());
        assert!(matches!(verdict, RunVerdict::Pass { matched: 2 }));
    }

    #[tokio::test]
    async fn test_ordered_fails_at_exactly_the_broken_entry() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt", "Done"])]));
        let mut queue = feed(&["[INFO] Init gdt", "[ERROR] Kernel panic"]);

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        match verdict {
            RunVerdict::Fail {
                error:
                    VerifyError::Mismatch {
                        case,
                        index,
                        expected,
                        found,
                    },
            } => {
                assert_eq!(case, "boot");
                assert_eq!(index, 2);
                assert_eq!(expected, "[INFO] Done");
                assert_eq!(found, "[ERROR] Kernel panic");
            }
            other => panic!("expected mismatch at entry 2, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_first_line_mismatch_reports_entry_one() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt"])]));
        let mut queue = feed(&["[INFO] Init idt"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::Mismatch { index, .. },
            } => assert_eq!(index, 1),
            other => panic!("expected mismatch at entry 1, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_times_out_on_silent_stream() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt"])]));
        let (_tx, mut queue) = mpsc::unbounded_channel::<String>();

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::Timeout { case, index, expected },
            } => {
                assert_eq!(case, "boot");
                assert_eq!(index, 1);
                assert_eq!(expected, "[INFO] Init gdt");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_early_stream_end_fails_on_first_outstanding_entry() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt", "Done"])]));
        let mut queue = feed(&["[INFO] Init gdt"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::Timeout { index, expected, .. },
            } => {
                assert_eq!(index, 2);
                assert_eq!(expected, "[INFO] Done");
            }
            other => panic!("expected timeout on entry 2, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_ordered_trims_whitespace_before_matching() {
        let mut strategy = Ordered::new(sequence(&[("boot", &["Init gdt"])]));
        let mut queue = feed(&["  [INFO] Init gdt \t"]);

        assert!(drive(&mut strategy, &mut queue, TICK).await.is_pass());
    }

    #[tokio::test]
    async fn test_ordered_crosses_case_boundaries_in_order() {
        let mut strategy = Ordered::new(sequence(&[
            ("first", &["Init gdt", "Done"]),
            ("second", &["Init idt"]),
        ]));
        let mut queue = feed(&["[INFO] Init gdt", "[INFO] Done", "[INFO] Init idt"]);

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        assert!(matches!(verdict, RunVerdict::Pass { matched: 3 }));
    }

    #[tokio::test]
    async fn test_ordered_wildcard_entry_accepts_any_payload() {
        let mut strategy = Ordered::new(sequence(&[("pit", &["Init pit", ".+", "Done"])]));
        let mut queue = feed(&[
            "[INFO] Init pit",
            "[INFO] PIT running at 1000hz",
            "[INFO] Done",
        ]);

        assert!(drive(&mut strategy, &mut queue, TICK).await.is_pass());
    }

    #[tokio::test]
    async fn test_empty_sequence_passes_without_reading() {
        let mut strategy = Ordered::new(ExpectedSequence::default());
        let (_tx, mut queue) = mpsc::unbounded_channel::<String>();

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        assert!(matches!(verdict, RunVerdict::Pass { matched: 0 }));
    }

    #[tokio::test]
    async fn test_unordered_passes_on_any_interleaving() {
        let expected = vec![
            "Init mem".to_string(),
            "Done mem".to_string(),
            "Init pmm".to_string(),
        ];
        let mut strategy = UnorderedRemoval::new(expected, "FAILURE");
        let mut queue = feed(&[
            "[INFO] Init pmm with 128 frames",
            "unrelated noise",
            "[INFO] Init mem, Done mem",
        ]);

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        assert!(matches!(verdict, RunVerdict::Pass { matched: 3 }));
    }

    #[tokio::test]
    async fn test_unordered_failure_marker_is_fatal_regardless_of_progress() {
        let expected = vec!["Init mem".to_string(), "Init pmm".to_string()];
        let mut strategy = UnorderedRemoval::new(expected, "FAILURE");
        let mut queue = feed(&["FAILURE: page fault"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::TargetFault { line },
            } => assert_eq!(line, "FAILURE: page fault"),
            other => panic!("expected target fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unordered_timeout_reports_outstanding_set() {
        let expected = vec!["Init mem".to_string(), "Init pmm".to_string()];
        let mut strategy = UnorderedRemoval::new(expected, "FAILURE");
        let mut queue = feed(&["[INFO] Init mem done"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::Outstanding { remaining },
            } => assert_eq!(remaining, vec!["Init pmm".to_string()]),
            other => panic!("expected outstanding set, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_latch_success_marker_ends_the_run() {
        let mut strategy = KeywordLatch::new("SUCCESS", "FAILURE", 3);
        let mut queue = feed(&["booting", "still booting", "rt tests: SUCCESS"]);

        let verdict = drive(&mut strategy, &mut queue, TICK).await;
        assert!(matches!(verdict, RunVerdict::Pass { matched: 1 }));
    }

    #[tokio::test]
    async fn test_latch_failure_marker_wins_over_later_success() {
        let mut strategy = KeywordLatch::new("SUCCESS", "FAILURE", 3);
        let mut queue = feed(&["FAILURE: triple fault", "SUCCESS"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::TargetFault { .. },
            } => {}
            other => panic!("expected target fault, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_latch_exhausts_its_empty_read_budget() {
        let mut strategy = KeywordLatch::new("SUCCESS", "FAILURE", 2);
        let (_tx, mut queue) = mpsc::unbounded_channel::<String>();

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::MarkerTimeout { reads },
            } => assert_eq!(reads, 2),
            other => panic!("expected marker timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_latch_abrupt_stream_end_is_a_fault() {
        let mut strategy = KeywordLatch::new("SUCCESS", "FAILURE", 5);
        let mut queue = feed(&["booting"]);

        match drive(&mut strategy, &mut queue, TICK).await {
            RunVerdict::Fail {
                error: VerifyError::AbruptExit,
            } => {}
            other => panic!("expected abrupt exit, got {other:?}"),
        }
    }
}
