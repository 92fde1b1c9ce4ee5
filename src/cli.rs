// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `cxxrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cxxrun",
    version,
    about = "Compile a single source file, run it, and forward terminal input to it.",
    long_about = None
)]
pub struct CliArgs {
    /// Source file to compile and run.
    #[arg(
        value_name = "FILE",
        required_unless_present = "code",
        conflicts_with = "code"
    )]
    pub file: Option<PathBuf>,

    /// Source code to compile and run instead of a file.
    ///
    /// Written to `[run].scratch_dir` and removed when the program ends.
    #[arg(long, value_name = "SOURCE")]
    pub code: Option<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Cxxrun.toml` in the current working directory if it exists,
    /// otherwise built-in g++ settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override `[toolchain].compiler`.
    #[arg(long, value_name = "PROG")]
    pub compiler: Option<String>,

    /// Leave the compiled binary on disk after the program ends.
    #[arg(long)]
    pub keep_artifacts: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `CXXRUN_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve config and print the commands, but don't run anything.
    #[arg(long)]
    pub dry_run: bool,
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
