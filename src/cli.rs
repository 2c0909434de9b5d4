// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for the `ninja-regen` inspection tool.
///
/// The library drives manifest regeneration inside the orchestrator; this
/// binary exists to poke at the on-disk state it leaves behind when
/// debugging a build tree.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "ninja-regen",
    version,
    about = "Inspect glob-dirs caches and watch files used for manifest regeneration.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to a `.ninja_glob_dirs` cache file to dump.
    #[arg(long, value_name = "PATH")]
    pub cache: Option<PathBuf>,

    /// Path to an explicit glob watch file to validate.
    #[arg(long, value_name = "PATH")]
    pub watchfile: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `NINJA_REGEN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
