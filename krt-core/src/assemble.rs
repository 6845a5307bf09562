//! Case assembly: fixed pre/post phases around a pluggable architecture
//! segment.
//!
//! The expected sequence for a run is always three segments concatenated in
//! a fixed, significant order: core subsystems that initialize before
//! architecture bring-up, the architecture-specific segment resolved from
//! the registry, then subsystems initialized after bring-up (display and
//! console drivers, final init marker).

use crate::error::ConfigError;
use crate::model::{ExpectedSequence, Level, TestCase};

/// An architecture extension contributes its own init/test cases.
///
/// Implementations are resolved once at startup through [`lookup`]; the
/// returned cases are normalized into the common model by construction.
pub trait ArchCases: Sync {
    /// Registry identifier, e.g. `"x86"`.
    fn id(&self) -> &'static str;

    /// The architecture-specific segment, in emission order.
    fn test_cases(&self) -> Vec<TestCase>;
}

/// Concatenate the three segments in their fixed order.
pub fn assemble(
    pre: Vec<TestCase>,
    arch: Vec<TestCase>,
    post: Vec<TestCase>,
) -> ExpectedSequence {
    let mut cases = pre;
    cases.extend(arch);
    cases.extend(post);
    ExpectedSequence::new(cases)
}

/// Cases emitted before architecture bring-up.
pub fn pre_arch_cases() -> Vec<TestCase> {
    vec![TestCase::from_patterns(
        "Arch init starts",
        &[r"Init arch \w+"],
        Level::Info,
    )]
}

/// Cases emitted after architecture bring-up.
pub fn post_arch_cases() -> Vec<TestCase> {
    vec![
        TestCase::from_patterns("Arch init finishes", &["Arch init done"], Level::Info),
        TestCase::from_patterns("VGA init", &["Init vga", "Done"], Level::Info),
        TestCase::from_patterns(
            "VGA tests",
            &[
                "VGA: Tested max scan line",
                "VGA: Tested cursor shape",
                "VGA: Tested updating cursor",
            ],
            Level::Info,
        ),
        TestCase::from_patterns("TTY init", &["Init tty", "Done"], Level::Info),
        TestCase::from_patterns(
            "TTY tests",
            &["TTY: Tested globals", "TTY: Tested printing"],
            Level::Info,
        ),
        TestCase::from_patterns("Init finishes", &["Init done"], Level::Info),
    ]
}

/// The complete expected sequence for one run against `arch`.
pub fn default_sequence(arch: &str) -> Result<ExpectedSequence, ConfigError> {
    let extension = lookup(arch).ok_or_else(|| ConfigError::UnknownArch {
        arch: arch.to_string(),
        known: known_architectures(),
    })?;
    Ok(assemble(
        pre_arch_cases(),
        extension.test_cases(),
        post_arch_cases(),
    ))
}

// ── Registry ─────────────────────────────────────────────────────────────

static X86: X86Cases = X86Cases;

/// Resolve an architecture identifier to its extension.
pub fn lookup(arch: &str) -> Option<&'static dyn ArchCases> {
    match arch {
        "x86" => Some(&X86),
        _ => None,
    }
}

/// Identifiers with a registered extension, for diagnostics.
pub fn known_architectures() -> Vec<&'static str> {
    vec![X86.id()]
}

// ── x86 ──────────────────────────────────────────────────────────────────

struct X86Cases;

impl ArchCases for X86Cases {
    fn id(&self) -> &'static str {
        "x86"
    }

    fn test_cases(&self) -> Vec<TestCase> {
        vec![
            TestCase::from_patterns("GDT init", &["Init gdt", "Done"], Level::Info),
            TestCase::from_patterns("GDT tests", &["GDT: Tested loading GDT"], Level::Info),
            TestCase::from_patterns("IDT init", &["Init idt", "Done"], Level::Info),
            // The PIT reports its programmed frequency on a line of its own;
            // the exact value depends on the divisor, hence the wildcard.
            TestCase::from_patterns("PIT init", &["Init pit", ".+", "Done"], Level::Info),
            TestCase::from_patterns("Syscalls init", &["Init syscalls", "Done"], Level::Info),
            TestCase::from_patterns(
                "Syscall tests",
                &[
                    "Syscalls: Tested no args",
                    "Syscalls: Tested 1 arg",
                    "Syscalls: Tested 2 args",
                    "Syscalls: Tested 3 args",
                    "Syscalls: Tested 4 args",
                    "Syscalls: Tested 5 args",
                ],
                Level::Info,
            ),
        ]
    }
}
