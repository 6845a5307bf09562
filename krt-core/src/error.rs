//! Error taxonomy for a verification run.
//!
//! Every variant of [`VerifyError`] is fatal and fail-fast: the first one
//! encountered ends the run. [`ConfigError`] covers problems detected before
//! a run exists (bad config file, unknown architecture), which never launch
//! the target at all.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A fatal verification failure. Diagnostics use 1-based entry indices,
/// matching the per-entry PASS progress output.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// An observed line did not satisfy the current expected entry.
    #[error("{case} #{index}, expected '{expected}', found '{found}'")]
    Mismatch {
        case: String,
        index: usize,
        expected: String,
        found: String,
    },

    /// No line arrived within the bound while an entry was outstanding.
    /// Also reported when the stream closes with entries still unmatched.
    #[error("timed out waiting for '{expected}' ({case} #{index})")]
    Timeout {
        case: String,
        index: usize,
        expected: String,
    },

    /// Unordered discipline: the wait expired with literals still unmatched.
    #[error("timed out with {} expectation(s) outstanding: {}", remaining.len(), remaining.join(", "))]
    Outstanding { remaining: Vec<String> },

    /// The declared expectation set is ambiguous under substring matching.
    #[error("ambiguous expectation set: '{first}' and '{second}' contain one another")]
    Conflict { first: String, second: String },

    /// The target reported an internal failure through its output.
    #[error("target reported a fault: '{line}'")]
    TargetFault { line: String },

    /// The target exited without emitting a terminal marker (latch mode).
    #[error("target exited before reaching a terminal marker")]
    AbruptExit,

    /// Latch mode: the empty-read budget ran out with no marker observed.
    #[error("no terminal marker observed after {reads} empty reads")]
    MarkerTimeout { reads: u32 },

    /// An expected entry's pattern failed to compile.
    #[error("invalid expected pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The target could not be launched or its output captured.
    #[error("failed to launch target: {0}")]
    Spawn(#[from] io::Error),
}

/// A configuration problem that prevents a run from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No architecture extension is registered under this identifier.
    #[error("unknown target architecture '{arch}' (known: {})", .known.join(", "))]
    UnknownArch {
        arch: String,
        known: Vec<&'static str>,
    },

    /// The unordered discipline was selected with no expected literals.
    #[error("no expected literals configured for the unordered discipline")]
    EmptyExpectations,

    #[error("no launch command configured")]
    MissingCommand,
}
