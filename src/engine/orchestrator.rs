// src/engine/orchestrator.rs

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::{ConfigFile, RunSection};
use crate::errors::{CxxrunError, Result};
use crate::exec::{
    CompletionSignal, CompletionWaiter, ConsoleSink, DrainTask, GenerationHandles, ProcessSlot,
    StdoutSink, Toolchain, WaitTask, completion_signal, spawn_drainer, spawn_waiter,
};
use crate::fs::{ArtifactGuard, write_source};
use crate::types::{Generation, GenerationOutcome, Stage};

/// Compile-then-run orchestrator for a single source file.
///
/// Responsibilities:
/// - Validate the source and run the compile stage, blocking the caller
///   until the compiler has exited *and* its output has been drained.
/// - On success, launch the program and return immediately, leaving it
///   interactive through [`send_input`](Self::send_input).
/// - Enforce that at most one process is active at any time.
///
/// Background failures (drain errors, non-zero program exit) are logged and
/// visible only through [`is_running`](Self::is_running) and
/// [`wait_for_exit`](Self::wait_for_exit).
pub struct Orchestrator {
    toolchain: Toolchain,
    run: RunSection,
    slot: Arc<ProcessSlot>,
    sink: Arc<dyn ConsoleSink>,
    last_run: Mutex<Option<CompletionWaiter<GenerationOutcome>>>,
}

impl Orchestrator {
    /// Build an orchestrator writing to the given sink.
    ///
    /// Probes the compiler first; fails with `ToolchainUnavailable` if it
    /// cannot be started or its version query exits non-zero.
    pub async fn new(config: &ConfigFile, sink: Arc<dyn ConsoleSink>) -> Result<Self> {
        let toolchain = Toolchain::from_config(&config.toolchain);
        toolchain.probe().await?;

        Ok(Self {
            toolchain,
            run: config.run.clone(),
            slot: Arc::new(ProcessSlot::new()),
            sink,
            last_run: Mutex::new(None),
        })
    }

    /// Same as [`new`](Self::new), writing to this process's stdout.
    pub async fn with_stdout(config: &ConfigFile) -> Result<Self> {
        Self::new(config, Arc::new(StdoutSink)).await
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    /// Compile `source` and, if that succeeds, start the program.
    ///
    /// Returns the run generation once the program has been launched; it
    /// does not wait for the program to finish.
    pub async fn compile_and_run(&self, source: impl AsRef<Path>) -> Result<Generation> {
        let source = self.toolchain.validate_source(source.as_ref())?;
        self.launch(source, None).await
    }

    /// Write `code` to the scratch source file and compile/run it.
    ///
    /// The scratch file is removed together with the binary when the run
    /// ends.
    pub async fn compile_and_run_code(&self, code: &str) -> Result<Generation> {
        self.ensure_idle()?;

        let file_name = self.toolchain.source_file_name(&self.run.scratch_source_name);
        let path = write_source(&self.run.scratch_dir, &file_name, code)?;
        let source = path.canonicalize()?;
        self.launch(source.clone(), Some(source)).await
    }

    async fn launch(&self, source: PathBuf, transient: Option<PathBuf>) -> Result<Generation> {
        self.ensure_idle()?;

        let binary = self.toolchain.binary_path(&source);
        let mut artifacts = if self.run.keep_artifacts {
            ArtifactGuard::keep_on_drop()
        } else {
            ArtifactGuard::new()
        };
        artifacts.track(&binary);
        if let Some(path) = transient {
            artifacts.track(path);
        }

        info!(source = ?source, binary = ?binary, "compiling");
        let compiler = self
            .toolchain
            .compile_command(&source, &binary)
            .spawn()
            .map_err(|e| {
                CxxrunError::ToolchainUnavailable(format!(
                    "could not start '{}': {e}",
                    self.toolchain.compiler()
                ))
            })?;
        let handles = self.slot.install(compiler, Stage::Compile)?;
        let compile_generation = handles.generation;
        let (compile_tx, _compile_rx) = completion_signal();

        // The compile generation keeps the slot after it exits until the
        // hand-over below: a `kill()` in between is seen by `replace`, and no
        // other launch can take the slot.
        let outcome = match self.spawn_generation(handles, None, compile_tx).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.release(compile_generation, artifacts);
                return Err(anyhow::Error::from(e).into());
            }
        };

        match outcome {
            GenerationOutcome::Killed => {
                info!("compile stage was killed");
                drop(artifacts);
                return Err(CxxrunError::Killed);
            }
            outcome if outcome.is_success() => {}
            other => {
                info!(outcome = ?other, "compilation failed; program will not run");
                self.release(compile_generation, artifacts);
                return Err(CxxrunError::CompileFailed(other.exit_code()));
            }
        }

        info!(binary = ?binary, "compilation succeeded; starting program");
        let program = match self.toolchain.run_command(&binary).spawn() {
            Ok(program) => program,
            Err(e) => {
                self.release(compile_generation, artifacts);
                return Err(e.into());
            }
        };
        // On failure the slot is already empty (killed) and the dropped
        // child is killed with it.
        let handles = self
            .slot
            .replace(compile_generation, program, Stage::Run)?;
        let generation = handles.generation;

        let (run_tx, run_rx) = completion_signal();
        *self.lock_last_run() = Some(run_rx);

        // Detached: the waiter owns the artifacts and clears the slot.
        let _run = self.spawn_generation(handles, Some(artifacts), run_tx);
        Ok(generation)
    }

    /// Give up a compile generation that will not be followed by a run.
    ///
    /// Artifacts go first so the next launch never races their removal.
    fn release(&self, compile_generation: Generation, artifacts: ArtifactGuard) {
        drop(artifacts);
        self.slot.clear_generation(compile_generation);
    }

    fn spawn_generation(
        &self,
        handles: GenerationHandles,
        artifacts: Option<ArtifactGuard>,
        outcome: CompletionSignal<GenerationOutcome>,
    ) -> JoinHandle<GenerationOutcome> {
        let GenerationHandles {
            generation,
            stage,
            child,
            stdout,
            stderr,
            killed,
            drained,
            drained_waiter,
        } = handles;

        spawn_drainer(DrainTask {
            generation,
            stage,
            stdout,
            stderr,
            killed: killed.clone(),
            drained,
            sink: Arc::clone(&self.sink),
        });

        spawn_waiter(WaitTask {
            generation,
            stage,
            child,
            killed,
            drained: drained_waiter,
            slot: Arc::clone(&self.slot),
            artifacts,
            outcome,
        })
    }

    /// Write `text` plus one newline to the active process and flush.
    pub async fn send_input(&self, text: &str) -> Result<()> {
        let (generation, input) = self.slot.input()?;

        let mut line = String::with_capacity(text.len() + 1);
        line.push_str(text);
        line.push('\n');

        let mut stdin = input.lock().await;
        let pipe = stdin.as_mut().ok_or(CxxrunError::InputClosed)?;
        pipe.write_all(line.as_bytes()).await?;
        pipe.flush().await?;

        debug!(%generation, bytes = line.len(), "forwarded input line");
        Ok(())
    }

    /// Close the active process's stdin so it sees end-of-input.
    ///
    /// Closing an already closed stdin is a no-op.
    pub async fn close_input(&self) -> Result<()> {
        let (generation, input) = self.slot.input()?;
        let closed = input.lock().await.take();
        if let Some(mut pipe) = closed {
            if let Err(e) = pipe.shutdown().await {
                warn!(%generation, error = %e, "error while closing stdin");
            }
            debug!(%generation, "stdin closed");
        }
        Ok(())
    }

    /// True while the program runs. The compile stage does not count.
    pub fn is_running(&self) -> bool {
        self.slot.is_running()
    }

    pub fn active(&self) -> Option<(Generation, Stage)> {
        self.slot.active()
    }

    /// Kill the active process, compiler or program, without waiting for it
    /// or its output.
    ///
    /// Returns `false` if nothing was running.
    pub fn kill(&self) -> bool {
        self.slot.kill().is_some()
    }

    /// Wait for the most recently launched program to finish.
    ///
    /// `None` if no program was ever launched. Cancel-safe.
    pub async fn wait_for_exit(&self) -> Option<GenerationOutcome> {
        let waiter = self.lock_last_run().clone();
        match waiter {
            Some(waiter) => waiter.wait().await,
            None => None,
        }
    }

    fn ensure_idle(&self) -> Result<()> {
        match self.slot.active() {
            Some((generation, _)) => Err(CxxrunError::AlreadyRunning(generation.0)),
            None => Ok(()),
        }
    }

    fn lock_last_run(&self) -> std::sync::MutexGuard<'_, Option<CompletionWaiter<GenerationOutcome>>> {
        self.last_run.lock().unwrap_or_else(|e| e.into_inner())
    }
}
