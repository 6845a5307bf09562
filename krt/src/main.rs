//! Kernel Runtime Test - boot-time conformance CLI.
//!
//! Launches the kernel under test, verifies its console output against the
//! expected boot sequence, and exits 0 on a full pass or 1 on the first
//! mismatch, timeout, or detected conflict.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use krt_core::{Mode, RunConfig, RunVerdict, runner};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "krt")]
#[command(author, version, about = "Kernel runtime-test harness - boot log verification")]
struct Cli {
    /// Launch command for the target, e.g. "zig build run -Drt-test=true"
    #[arg(short, long)]
    command: Option<String>,

    /// Target architecture identifier
    #[arg(short, long)]
    arch: Option<String>,

    /// Verification discipline: ordered, unordered, or latch
    #[arg(short, long)]
    mode: Option<Mode>,

    /// Per-line wait bound, e.g. "5s" or "500ms"
    #[arg(long)]
    line_timeout: Option<String>,

    /// Expected literal for the unordered discipline (repeatable)
    #[arg(long = "expect")]
    expect: Vec<String>,

    /// Path to a TOML run configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    let mut config = match &cli.config {
        Some(path) => RunConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RunConfig::default(),
    };

    if let Some(command) = cli.command {
        config.command = command;
    }
    if let Some(arch) = cli.arch {
        config.arch = arch;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(raw) = &cli.line_timeout {
        config.line_timeout = humantime::parse_duration(raw)
            .with_context(|| format!("invalid --line-timeout '{raw}'"))?;
    }
    if !cli.expect.is_empty() {
        config.expected = cli.expect;
    }

    info!(mode = %config.mode, arch = %config.arch, "starting verification run");

    let verdict = runner::run(&config).await?;
    match verdict {
        RunVerdict::Pass { matched } => {
            println!("PASS: {matched} expectation(s) verified");
            Ok(())
        }
        RunVerdict::Fail { error } => {
            println!("FAILURE: {error}");
            std::process::exit(1);
        }
    }
}
