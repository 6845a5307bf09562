//! Run configuration: launch command, architecture, discipline, and the
//! verification knobs.
//!
//! A run is configured from a TOML file (`[target]` and `[verify]` tables)
//! with optional caller-side overrides applied on top, or built directly
//! with [`RunConfig::new`]. File values always replace defaults; absent
//! values keep them.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Default bound on each individual queue wait.
pub const DEFAULT_LINE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default empty-read budget for the keyword-latch discipline.
pub const DEFAULT_MAX_EMPTY_READS: u32 = 10;

/// Which matching discipline verifies the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Strict ordered full-line matching against the assembled sequence.
    Ordered,
    /// Substring-removal over a declared literal set.
    Unordered,
    /// Terminal success/failure keyword latch.
    Latch,
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ordered" => Ok(Mode::Ordered),
            "unordered" => Ok(Mode::Unordered),
            "latch" => Ok(Mode::Latch),
            other => Err(format!(
                "unknown mode '{other}' (expected ordered, unordered, or latch)"
            )),
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Ordered => write!(f, "ordered"),
            Mode::Unordered => write!(f, "unordered"),
            Mode::Latch => write!(f, "latch"),
        }
    }
}

/// Everything one verification run needs to know.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Opaque launch command, run via `sh -c`.
    pub command: String,
    /// Architecture identifier resolved through the registry.
    pub arch: String,
    pub mode: Mode,
    /// Bound on each individual queue wait.
    pub line_timeout: Duration,
    /// Latch mode: consecutive timed-out reads tolerated before failing.
    pub max_empty_reads: u32,
    pub success_marker: String,
    pub failure_marker: String,
    /// Unordered mode: the expected literal set.
    pub expected: Vec<String>,
}

impl RunConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            arch: "x86".to_string(),
            mode: Mode::Ordered,
            line_timeout: DEFAULT_LINE_TIMEOUT,
            max_empty_reads: DEFAULT_MAX_EMPTY_READS,
            success_marker: "SUCCESS".to_string(),
            failure_marker: "FAILURE".to_string(),
            expected: Vec::new(),
        }
    }

    /// Load a config file and lay its values over the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ConfigFile = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = RunConfig::new(file.target.command.unwrap_or_default());
        if let Some(arch) = file.target.arch {
            config.arch = arch;
        }
        let verify = file.verify;
        if let Some(mode) = verify.mode {
            config.mode = mode;
        }
        if let Some(secs) = verify.line_timeout_secs {
            config.line_timeout = Duration::from_secs(secs);
        }
        if let Some(reads) = verify.max_empty_reads {
            config.max_empty_reads = reads;
        }
        if let Some(marker) = verify.success_marker {
            config.success_marker = marker;
        }
        if let Some(marker) = verify.failure_marker {
            config.failure_marker = marker;
        }
        if let Some(expected) = verify.expected {
            config.expected = expected;
        }
        Ok(config)
    }

    /// A run cannot start without a launch command.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.command.trim().is_empty() {
            return Err(ConfigError::MissingCommand);
        }
        if self.mode == Mode::Unordered && self.expected.is_empty() {
            return Err(ConfigError::EmptyExpectations);
        }
        Ok(())
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    target: TargetTable,
    #[serde(default)]
    verify: VerifyTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct TargetTable {
    command: Option<String>,
    arch: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct VerifyTable {
    mode: Option<Mode>,
    line_timeout_secs: Option<u64>,
    max_empty_reads: Option<u32>,
    success_marker: Option<String>,
    failure_marker: Option<String>,
    expected: Option<Vec<String>>,
}
