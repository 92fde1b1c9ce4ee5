// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, load_or_default};
use crate::engine::Orchestrator;
use crate::errors::CxxrunError;
use crate::types::GenerationOutcome;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the orchestrator (toolchain probe, compile, launch)
/// - terminal stdin forwarding
/// - Ctrl-C handling (kills the active process)
///
/// Returns the exit code the binary should exit with.
pub async fn run(args: CliArgs) -> Result<i32> {
    let mut cfg = load_or_default(args.config.as_deref())?;
    if let Some(ref compiler) = args.compiler {
        cfg.toolchain.compiler = compiler.clone();
    }
    if args.keep_artifacts {
        cfg.run.keep_artifacts = true;
    }

    if args.dry_run {
        print_dry_run(&cfg, &args);
        return Ok(0);
    }

    let orchestrator = Arc::new(Orchestrator::with_stdout(&cfg).await?);

    // Ctrl-C → kill whatever is running.
    {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            if orchestrator.kill() {
                info!("Ctrl-C received; killed active process");
            }
        });
    }

    let launched = match (&args.file, &args.code) {
        (Some(file), _) => orchestrator.compile_and_run(file).await,
        (None, Some(code)) => orchestrator.compile_and_run_code(code).await,
        (None, None) => bail!("either FILE or --code must be given"),
    };

    match launched {
        Ok(generation) => debug!(%generation, "program launched"),
        Err(CxxrunError::CompileFailed(code)) => {
            eprintln!("Error: compilation failed.");
            debug!(exit_code = code, "compile stage failed");
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    }

    forward_stdin(&orchestrator).await?;

    let code = match orchestrator.wait_for_exit().await {
        Some(GenerationOutcome::Exited(Some(code))) => code,
        Some(outcome) => {
            warn!(?outcome, "program did not exit normally");
            1
        }
        None => 0,
    };
    Ok(code)
}

/// Forward terminal lines to the running program until it exits.
///
/// End of terminal input closes the program's stdin.
async fn forward_stdin(orchestrator: &Orchestrator) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = orchestrator.wait_for_exit() => return Ok(()),
            line = lines.next_line() => {
                let Some(line) = line? else {
                    match orchestrator.close_input().await {
                        Ok(()) | Err(CxxrunError::NoActiveProcess) => return Ok(()),
                        Err(e) => return Err(e.into()),
                    }
                };
                match orchestrator.send_input(&line).await {
                    Ok(()) => {}
                    Err(CxxrunError::NoActiveProcess) => return Ok(()),
                    Err(e) => warn!(error = %e, "could not forward input line"),
                }
            }
        }
    }
}

/// Simple dry-run output: resolved toolchain and the commands that would run.
fn print_dry_run(cfg: &ConfigFile, args: &CliArgs) {
    let tc = &cfg.toolchain;
    println!("cxxrun dry-run");
    println!("  toolchain.compiler = {}", tc.compiler);
    println!("  toolchain.version_args = {:?}", tc.version_args);
    println!("  toolchain.source_extension = {}", tc.source_extension);
    println!("  toolchain.binary_name = {}", tc.binary_name);
    println!("  run.keep_artifacts = {}", cfg.run.keep_artifacts);
    println!();

    let toolchain = exec::Toolchain::from_config(tc);
    let source = match (&args.file, &args.code) {
        (Some(file), _) => file.clone(),
        _ => cfg
            .run
            .scratch_dir
            .join(toolchain.source_file_name(&cfg.run.scratch_source_name)),
    };

    let (compile, binary) = toolchain.describe(&source);
    println!("compile: {compile}");
    println!("run:     {binary}");
    if !toolchain.has_source_extension(Path::new(&source)) {
        println!(
            "warning: {} does not end in .{}",
            source.display(),
            toolchain.source_extension()
        );
    }

    debug!("dry-run complete (no execution)");
}
