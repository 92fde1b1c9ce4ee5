#![allow(dead_code)]

use std::path::Path;

use cxxrun::config::{ConfigFile, RawConfigFile, RunSection, ToolchainSection};

/// `sh -c` body used as a stand-in compiler: `$1` is the source, `$2` the
/// binary. Syntax is checked with `sh -n`, then the source is copied behind a
/// shebang and made executable.
const SHELL_COMPILE: &str = r#"echo "compiling $(basename "$1")"
sh -n "$1" && { printf '#!/bin/sh\n' > "$2"; cat "$1" >> "$2"; chmod +x "$2"; }"#;

const SHELL_COMPILE_QUIET: &str = r#"sh -n "$1" && { printf '#!/bin/sh\n' > "$2"; cat "$1" >> "$2"; chmod +x "$2"; }"#;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Built-in defaults (g++).
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                toolchain: ToolchainSection::default(),
                run: RunSection::default(),
            },
        }
    }

    /// A toolchain for `.sh` "sources" that needs nothing but `/bin/sh`.
    pub fn shell_toolchain() -> Self {
        Self::new().with_compile_script(SHELL_COMPILE)
    }

    /// Like [`shell_toolchain`](Self::shell_toolchain) but the compiler
    /// prints nothing.
    pub fn quiet_shell_toolchain() -> Self {
        Self::new().with_compile_script(SHELL_COMPILE_QUIET)
    }

    /// Quiet shell toolchain whose compiler takes about a second, long
    /// enough to observe the orchestrator mid-compile.
    pub fn slow_shell_toolchain() -> Self {
        Self::new().with_compile_script(&format!("sleep 1; {SHELL_COMPILE_QUIET}"))
    }

    /// Use `sh -c <script>` as the compiler, with `$1` = source and
    /// `$2` = binary.
    pub fn with_compile_script(mut self, script: &str) -> Self {
        let tc = &mut self.config.toolchain;
        tc.compiler = "sh".to_string();
        tc.compile_args = vec![
            "-c".to_string(),
            script.to_string(),
            "cxxrun-compile".to_string(),
            "{source}".to_string(),
            "{binary}".to_string(),
        ];
        tc.version_args = vec!["-c".to_string(), "exit 0".to_string()];
        tc.source_extension = "sh".to_string();
        self
    }

    pub fn with_compiler(mut self, compiler: &str) -> Self {
        self.config.toolchain.compiler = compiler.to_string();
        self
    }

    pub fn with_version_args(mut self, args: &[&str]) -> Self {
        self.config.toolchain.version_args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn with_binary_name(mut self, name: &str) -> Self {
        self.config.toolchain.binary_name = name.to_string();
        self
    }

    pub fn with_scratch_dir(mut self, dir: &Path) -> Self {
        self.config.run.scratch_dir = dir.to_path_buf();
        self
    }

    pub fn keep_artifacts(mut self, val: bool) -> Self {
        self.config.run.keep_artifacts = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
