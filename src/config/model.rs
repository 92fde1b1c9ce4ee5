// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration exactly as read from a TOML file, before validation.
///
/// ```toml
/// [toolchain]
/// compiler = "g++"
/// compile_args = ["-std=c++17", "{source}", "-o", "{binary}"]
/// version_args = ["--version"]
/// source_extension = "cpp"
/// binary_name = "prog"
///
/// [run]
/// scratch_dir = "."
/// scratch_source_name = "program"
/// keep_artifacts = false
/// ```
///
/// Both sections are optional; an empty file yields the g++ defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub toolchain: ToolchainSection,

    #[serde(default)]
    pub run: RunSection,
}

/// Validated configuration. Build it with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub toolchain: ToolchainSection,
    pub run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(toolchain: ToolchainSection, run: RunSection) -> Self {
        Self { toolchain, run }
    }
}

/// `[toolchain]` section: how to probe, compile and name the output.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolchainSection {
    /// Compiler program, looked up on `PATH` unless it contains a separator.
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Compiler arguments. `{source}` and `{binary}` are replaced with the
    /// source file path and the output binary path.
    #[serde(default = "default_compile_args")]
    pub compile_args: Vec<String>,

    /// Arguments for the availability probe run at construction.
    #[serde(default = "default_version_args")]
    pub version_args: Vec<String>,

    /// Required source file extension, without the leading dot.
    #[serde(default = "default_source_extension")]
    pub source_extension: String,

    /// File name of the compiled binary, placed next to the source file.
    #[serde(default = "default_binary_name")]
    pub binary_name: String,
}

fn default_compiler() -> String {
    "g++".to_string()
}

fn default_compile_args() -> Vec<String> {
    vec![
        "{source}".to_string(),
        "-o".to_string(),
        "{binary}".to_string(),
    ]
}

fn default_version_args() -> Vec<String> {
    vec!["--version".to_string()]
}

fn default_source_extension() -> String {
    "cpp".to_string()
}

fn default_binary_name() -> String {
    "prog".to_string()
}

impl Default for ToolchainSection {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            compile_args: default_compile_args(),
            version_args: default_version_args(),
            source_extension: default_source_extension(),
            binary_name: default_binary_name(),
        }
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Directory where source passed as a string is written before compiling.
    #[serde(default = "default_scratch_dir")]
    pub scratch_dir: PathBuf,

    /// File stem for source passed as a string; the toolchain extension is
    /// appended.
    #[serde(default = "default_scratch_source_name")]
    pub scratch_source_name: String,

    /// Leave the compiled binary (and any scratch source) on disk after the
    /// run generation ends.
    #[serde(default)]
    pub keep_artifacts: bool,
}

fn default_scratch_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_scratch_source_name() -> String {
    "program".to_string()
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            scratch_dir: default_scratch_dir(),
            scratch_source_name: default_scratch_source_name(),
            keep_artifacts: false,
        }
    }
}
