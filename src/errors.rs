// src/errors.rs

//! Crate-wide error type and result alias.
//!
//! Only the synchronous paths (construction, validation, compile stage,
//! input forwarding) return these to the caller. Failures inside background
//! waiter/drainer tasks are logged instead; see [`crate::exec`].

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CxxrunError {
    #[error("Toolchain unavailable: {0}")]
    ToolchainUnavailable(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Compilation failed (exit code {})", fmt_code(.0))]
    CompileFailed(Option<i32>),

    #[error("No active process")]
    NoActiveProcess,

    #[error("Input stream of the active process is closed")]
    InputClosed,

    #[error("A process is already active (generation {0})")]
    AlreadyRunning(u64),

    #[error("Process was killed before it finished")]
    Killed,

    #[error("Process exited abnormally (exit code {})", fmt_code(.0))]
    ProcessExitNonZero(Option<i32>),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn fmt_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none, terminated by signal".to_string(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, CxxrunError>;
