// src/exec/toolchain.rs

//! Compile and run command construction for the configured toolchain.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::config::ToolchainSection;
use crate::errors::{CxxrunError, Result};

/// A compiler invocation template plus naming rules, built from
/// `[toolchain]`.
#[derive(Debug, Clone)]
pub struct Toolchain {
    compiler: String,
    compile_args: Vec<String>,
    version_args: Vec<String>,
    source_extension: String,
    binary_name: String,
}

impl Toolchain {
    pub fn from_config(cfg: &ToolchainSection) -> Self {
        Self {
            compiler: cfg.compiler.clone(),
            compile_args: cfg.compile_args.clone(),
            version_args: cfg.version_args.clone(),
            source_extension: cfg.source_extension.clone(),
            binary_name: cfg.binary_name.clone(),
        }
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn source_extension(&self) -> &str {
        &self.source_extension
    }

    /// Run the compiler with its version arguments and require exit 0.
    pub async fn probe(&self) -> Result<()> {
        debug!(compiler = %self.compiler, args = ?self.version_args, "probing toolchain");

        let status = Command::new(&self.compiler)
            .args(&self.version_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                CxxrunError::ToolchainUnavailable(format!(
                    "could not start '{}': {e}",
                    self.compiler
                ))
            })?;

        if !status.success() {
            return Err(CxxrunError::ToolchainUnavailable(format!(
                "'{}' version probe exited with {status}",
                self.compiler
            )));
        }

        info!(compiler = %self.compiler, "toolchain available");
        Ok(())
    }

    /// Check that `path` names an existing file with the source extension and
    /// return its absolute form.
    pub fn validate_source(&self, path: &Path) -> Result<PathBuf> {
        if !self.has_source_extension(path) {
            return Err(CxxrunError::InvalidInput(format!(
                "{} must have extension \".{}\"",
                path.display(),
                self.source_extension
            )));
        }
        if !path.is_file() {
            return Err(CxxrunError::InvalidInput(format!(
                "{} does not exist or is not a file",
                path.display()
            )));
        }
        Ok(path.canonicalize()?)
    }

    pub fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == self.source_extension)
    }

    /// File name for source written from a string.
    pub fn source_file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.source_extension)
    }

    /// Where the compiled binary for `source` goes: next to the source.
    pub fn binary_path(&self, source: &Path) -> PathBuf {
        match source.parent() {
            Some(dir) => dir.join(&self.binary_name),
            None => PathBuf::from(&self.binary_name),
        }
    }

    /// Compiler arguments with `{source}` and `{binary}` substituted.
    pub fn expand_compile_args(&self, source: &Path, binary: &Path) -> Vec<String> {
        let source = source.to_string_lossy();
        let binary = binary.to_string_lossy();
        self.compile_args
            .iter()
            .map(|arg| arg.replace("{source}", &source).replace("{binary}", &binary))
            .collect()
    }

    /// Compiler process: no stdin, both output streams piped.
    pub fn compile_command(&self, source: &Path, binary: &Path) -> Command {
        let mut cmd = Command::new(&self.compiler);
        cmd.args(self.expand_compile_args(source, binary));
        if let Some(dir) = source.parent() {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Program process: no arguments, cwd next to the binary, all three
    /// streams piped.
    pub fn run_command(&self, binary: &Path) -> Command {
        let mut cmd = Command::new(binary);
        if let Some(dir) = binary.parent() {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    /// Human-readable command lines, for `--dry-run`.
    pub fn describe(&self, source: &Path) -> (String, String) {
        let binary = self.binary_path(source);
        let compile = std::iter::once(self.compiler.clone())
            .chain(self.expand_compile_args(source, &binary))
            .collect::<Vec<_>>()
            .join(" ");
        (compile, binary.display().to_string())
    }
}
