// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, RunSection, ToolchainSection};
use crate::errors::{CxxrunError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CxxrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.toolchain, raw.run))
    }
}

/// Run all semantic checks on a raw config.
pub fn validate_config(cfg: &RawConfigFile) -> Result<()> {
    validate_raw_config(cfg)
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_toolchain(&cfg.toolchain)?;
    validate_run(&cfg.run)?;
    Ok(())
}

fn validate_toolchain(tc: &ToolchainSection) -> Result<()> {
    if tc.compiler.trim().is_empty() {
        return Err(CxxrunError::ConfigError(
            "[toolchain].compiler must not be empty".to_string(),
        ));
    }

    for placeholder in ["{source}", "{binary}"] {
        if !tc.compile_args.iter().any(|a| a.contains(placeholder)) {
            return Err(CxxrunError::ConfigError(format!(
                "[toolchain].compile_args must reference {placeholder}"
            )));
        }
    }

    let ext = tc.source_extension.as_str();
    if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
        return Err(CxxrunError::ConfigError(format!(
            "[toolchain].source_extension must be a bare extension like \"cpp\" (got {ext:?})"
        )));
    }

    ensure_plain_file_name("[toolchain].binary_name", &tc.binary_name)?;
    Ok(())
}

fn validate_run(run: &RunSection) -> Result<()> {
    ensure_plain_file_name("[run].scratch_source_name", &run.scratch_source_name)
}

fn ensure_plain_file_name(field: &str, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(CxxrunError::ConfigError(format!(
            "{field} must be a plain file name (got {name:?})"
        )));
    }
    Ok(())
}
