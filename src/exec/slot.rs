// src/exec/slot.rs

//! The single "currently active process" binding.
//!
//! All bindings of a generation (stdin handle, kill switch, generation id)
//! live in one struct behind one mutex, so readers never see a half-updated
//! slot. The child handle and its output pipes are *not* stored here: they
//! are handed out by value in [`GenerationHandles`] when the process is
//! installed, and the waiter/drainer tasks own them from then on.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::{Mutex as AsyncMutex, watch};
use tracing::{debug, info, warn};

use crate::errors::{CxxrunError, Result};
use crate::exec::signal::{CompletionSignal, CompletionWaiter, completion_signal};
use crate::types::{Generation, Stage};

/// Shared, closable stdin of the active process.
pub type InputHandle = Arc<AsyncMutex<Option<ChildStdin>>>;

/// Everything the slot keeps about the active generation.
struct ActiveProcess {
    generation: Generation,
    stage: Stage,
    pid: Option<u32>,
    stdin: InputHandle,
    kill_tx: watch::Sender<bool>,
}

/// Per-generation bindings, captured by value at install time.
///
/// Waiter and drainer tasks work only with these and never look at the live
/// slot again, so a later generation cannot disturb them.
pub struct GenerationHandles {
    pub generation: Generation,
    pub stage: Stage,
    pub child: Child,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
    /// Flips to `true` (or closes) when the generation is killed.
    pub killed: watch::Receiver<bool>,
    /// Fired by the drainer once output is fully consumed.
    pub drained: CompletionSignal<bool>,
    pub drained_waiter: CompletionWaiter<bool>,
}

/// Holds at most one active process.
#[derive(Default)]
pub struct ProcessSlot {
    active: Mutex<Option<ActiveProcess>>,
    next_generation: AtomicU64,
}

impl ProcessSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a freshly spawned child as the active process.
    ///
    /// Fails with `AlreadyRunning` if another generation is active; the
    /// rejected child is dropped (and killed, given `kill_on_drop`).
    pub fn install(&self, child: Child, stage: Stage) -> Result<GenerationHandles> {
        let mut active = self.lock();
        if let Some(current) = active.as_ref() {
            return Err(CxxrunError::AlreadyRunning(current.generation.0));
        }
        Ok(self.activate(&mut active, child, stage))
    }

    /// Swap `expected` for a new child under a single lock.
    ///
    /// Used to hand a finished compile generation over to its program. Fails
    /// with `Killed` if `expected` was killed in the meantime, or with
    /// `AlreadyRunning` if some other generation holds the slot.
    pub fn replace(
        &self,
        expected: Generation,
        child: Child,
        stage: Stage,
    ) -> Result<GenerationHandles> {
        let mut active = self.lock();
        match active.as_ref() {
            Some(current) if current.generation == expected => {
                debug!(%expected, %stage, "handing slot over to next stage");
                Ok(self.activate(&mut active, child, stage))
            }
            Some(current) => Err(CxxrunError::AlreadyRunning(current.generation.0)),
            None => {
                info!(%expected, "generation was killed before hand-over; dropping child");
                Err(CxxrunError::Killed)
            }
        }
    }

    fn activate(
        &self,
        active: &mut Option<ActiveProcess>,
        mut child: Child,
        stage: Stage,
    ) -> GenerationHandles {
        let generation = Generation(self.next_generation.fetch_add(1, Ordering::SeqCst) + 1);
        let pid = child.id();
        let stdin: InputHandle = Arc::new(AsyncMutex::new(child.stdin.take()));
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let (kill_tx, killed) = watch::channel(false);
        let (drained, drained_waiter) = completion_signal();

        *active = Some(ActiveProcess {
            generation,
            stage,
            pid,
            stdin,
            kill_tx,
        });

        info!(%generation, %stage, pid, "process installed in slot");

        GenerationHandles {
            generation,
            stage,
            child,
            stdout,
            stderr,
            killed,
            drained,
            drained_waiter,
        }
    }

    /// Clear the slot unconditionally. Returns the generation that was active.
    pub fn clear(&self) -> Option<Generation> {
        let previous = self.lock().take();
        previous.map(|p| {
            debug!(generation = %p.generation, stage = %p.stage, "slot cleared");
            p.generation
        })
    }

    /// Clear the slot only if `generation` is still the active one.
    ///
    /// Waiters use this so that a late completion can never clear a newer
    /// generation.
    pub fn clear_generation(&self, generation: Generation) -> bool {
        let mut active = self.lock();
        match active.as_ref() {
            Some(current) if current.generation == generation => {
                let stage = current.stage;
                *active = None;
                debug!(%generation, %stage, "slot cleared by its own generation");
                true
            }
            Some(current) => {
                debug!(
                    %generation,
                    active = %current.generation,
                    "stale generation tried to clear slot; ignoring"
                );
                false
            }
            None => false,
        }
    }

    /// Force-terminate the active process and clear the slot at once.
    ///
    /// The actual kill is carried out by the generation's waiter, which is
    /// listening on the kill switch; this call does not wait for it or for
    /// any buffered output.
    pub fn kill(&self) -> Option<Generation> {
        let taken = self.lock().take()?;
        info!(
            generation = %taken.generation,
            stage = %taken.stage,
            pid = taken.pid,
            "killing active process"
        );
        if taken.kill_tx.send(true).is_err() {
            warn!(
                generation = %taken.generation,
                "kill switch has no listeners; process already finished"
            );
        }
        Some(taken.generation)
    }

    /// True while any generation, compile or run, holds the slot.
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    /// True only while a program (not its compiler) holds the slot.
    pub fn is_running(&self) -> bool {
        matches!(self.active(), Some((_, Stage::Run)))
    }

    pub fn active(&self) -> Option<(Generation, Stage)> {
        self.lock().as_ref().map(|p| (p.generation, p.stage))
    }

    /// Stdin of the running program.
    ///
    /// A compiler never takes input, so a compile generation reports
    /// `NoActiveProcess` just like an empty slot.
    pub fn input(&self) -> Result<(Generation, InputHandle)> {
        self.lock()
            .as_ref()
            .filter(|p| p.stage == Stage::Run)
            .map(|p| (p.generation, Arc::clone(&p.stdin)))
            .ok_or(CxxrunError::NoActiveProcess)
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveProcess>> {
        // The guarded data is a plain Option swap, so a poisoned lock still
        // holds a consistent value.
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }
}
