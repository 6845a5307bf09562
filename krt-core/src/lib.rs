//! Boot-time conformance checking for a kernel under test.
//!
//! `krt-core` launches a target program as a subordinate process group,
//! captures its console output as an ordered stream of log lines, and
//! verifies that stream against a declarative expected-event sequence under
//! bounded per-line time budgets. It is a black-box checker: only the
//! target's externally observable output is inspected, never its internal
//! state, and verification is fail-fast — a single unexpected or missing
//! line fails the whole run.
//!
//! The pieces, leaves first:
//!
//! - [`model`]: expected entries, test cases, and the assembled sequence.
//! - [`assemble`]: the fixed pre/post phases and the architecture registry.
//! - [`supervisor`]: target process-group lifecycle with guaranteed teardown.
//! - [`reader`]: the stream-reader task feeding the line queue.
//! - [`sequencer`]: the driver loop and the three matching disciplines.
//! - [`conflict`]: pre-flight ambiguity check for the unordered discipline.
//! - [`runner`]: one-run orchestration tying it all together.

pub mod assemble;
pub mod config;
pub mod conflict;
pub mod error;
pub mod model;
pub mod reader;
pub mod runner;
pub mod sequencer;
pub mod supervisor;

pub use config::{Mode, RunConfig};
pub use error::{ConfigError, VerifyError};
pub use model::{ExpectedEntry, ExpectedSequence, Level, TestCase};
pub use sequencer::{MatchStrategy, RunVerdict};
