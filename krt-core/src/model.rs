//! Expected-event model: what the target is required to emit.
//!
//! An [`ExpectedSequence`] is an ordered list of [`TestCase`]s, each an
//! ordered, non-empty list of [`ExpectedEntry`]s. The sequence is built once
//! by the assembler and never mutated afterwards; the sequencer consumes it
//! strictly in order and never backtracks.

use crate::error::VerifyError;
use regex::Regex;

// ── Level prefix ─────────────────────────────────────────────────────────

/// Log-level token the target may prepend to a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Debug,
    Warning,
    Error,
}

impl Level {
    const ALL: [Level; 4] = [Level::Info, Level::Debug, Level::Warning, Level::Error];

    /// The wire token, including the trailing separator space.
    pub fn token(self) -> &'static str {
        match self {
            Level::Info => "[INFO] ",
            Level::Debug => "[DEBUG] ",
            Level::Warning => "[WARNING] ",
            Level::Error => "[ERROR] ",
        }
    }

    /// Split a recognized leading level token off a line, if present.
    pub fn split_token(line: &str) -> (Option<Level>, &str) {
        for level in Level::ALL {
            if let Some(rest) = line.strip_prefix(level.token()) {
                return (Some(level), rest);
            }
        }
        (None, line)
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Level::Info => write!(f, "info"),
            Level::Debug => write!(f, "debug"),
            Level::Warning => write!(f, "warning"),
            Level::Error => write!(f, "error"),
        }
    }
}

// ── Matcher ──────────────────────────────────────────────────────────────

/// How one expected entry compares against an incoming line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Matcher {
    /// Exact string equality against the full line.
    Literal(String),
    /// Anchored pattern match against the full line (never a partial find).
    Pattern(String),
}

impl Matcher {
    /// The raw expected text, for diagnostics.
    pub fn text(&self) -> &str {
        match self {
            Matcher::Literal(text) | Matcher::Pattern(text) => text,
        }
    }

    fn matches(&self, token: Option<&str>, line: &str) -> Result<bool, VerifyError> {
        match self {
            Matcher::Literal(text) => Ok(match token {
                Some(token) => line.strip_prefix(token).is_some_and(|rest| rest == text),
                None => line == text,
            }),
            Matcher::Pattern(pattern) => {
                let prefix = token.map(regex::escape).unwrap_or_default();
                let anchored = format!(r"\A{prefix}(?:{pattern})\z");
                let re = Regex::new(&anchored).map_err(|source| VerifyError::Pattern {
                    pattern: pattern.clone(),
                    source,
                })?;
                Ok(re.is_match(line))
            }
        }
    }
}

// ── Expected entry ───────────────────────────────────────────────────────

/// One declared log line the target must emit. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedEntry {
    matcher: Matcher,
    level: Option<Level>,
}

impl ExpectedEntry {
    /// An anchored-pattern entry with no declared level.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Pattern(pattern.into()),
            level: None,
        }
    }

    /// A literal full-line entry with no declared level.
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            matcher: Matcher::Literal(text.into()),
            level: None,
        }
    }

    /// Declare the level token the line must carry.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    pub fn level(&self) -> Option<Level> {
        self.level
    }

    /// The full expected text shown in diagnostics: level token + raw text.
    pub fn expected_text(&self) -> String {
        match self.level {
            Some(level) => format!("{}{}", level.token(), self.matcher.text()),
            None => self.matcher.text().to_string(),
        }
    }

    /// Test a trimmed incoming line against this entry.
    ///
    /// With a declared level the full line must carry that token; without
    /// one, any recognized leading token is stripped before comparison
    /// (prefix-insensitive matching).
    pub fn matches(&self, line: &str) -> Result<bool, VerifyError> {
        match self.level {
            Some(level) => self.matcher.matches(Some(level.token()), line),
            None => {
                let (_, rest) = Level::split_token(line);
                self.matcher.matches(None, rest)
            }
        }
    }
}

// ── Test case ────────────────────────────────────────────────────────────

/// A named, ordered group of expected entries: one logical verification
/// unit, e.g. a subsystem's init sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    name: String,
    entries: Vec<ExpectedEntry>,
}

impl TestCase {
    /// Entries must be non-empty; an empty case verifies nothing.
    pub fn new(name: impl Into<String>, entries: Vec<ExpectedEntry>) -> Self {
        let name = name.into();
        debug_assert!(!entries.is_empty(), "test case '{name}' has no entries");
        Self { name, entries }
    }

    /// Normalize a flat list of patterns into a case whose entries all carry
    /// the given level. This is the shape architecture extensions usually
    /// supply.
    pub fn from_patterns(name: impl Into<String>, patterns: &[&str], level: Level) -> Self {
        Self::new(
            name,
            patterns
                .iter()
                .map(|p| ExpectedEntry::pattern(*p).with_level(level))
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[ExpectedEntry] {
        &self.entries
    }
}

// ── Expected sequence ────────────────────────────────────────────────────

/// The full ordered expectation for one run. Read-only after assembly.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpectedSequence {
    cases: Vec<TestCase>,
}

impl ExpectedSequence {
    pub fn new(cases: Vec<TestCase>) -> Self {
        Self { cases }
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }

    /// Total number of expected entries across all cases.
    pub fn entry_count(&self) -> usize {
        self.cases.iter().map(|c| c.entries().len()).sum()
    }
}
