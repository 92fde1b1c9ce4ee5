// src/exec/waiter.rs

//! Exit waiter: waits for a generation's process to exit, then for its
//! drainer, and only then declares the generation finished.

use std::sync::Arc;

use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::errors::CxxrunError;
use crate::exec::signal::{CompletionSignal, CompletionWaiter};
use crate::exec::slot::ProcessSlot;
use crate::fs::ArtifactGuard;
use crate::types::{Generation, GenerationOutcome, Stage};

/// Everything one waiter needs, captured by value.
pub struct WaitTask {
    pub generation: Generation,
    pub stage: Stage,
    pub child: Child,
    pub killed: watch::Receiver<bool>,
    pub drained: CompletionWaiter<bool>,
    pub slot: Arc<ProcessSlot>,
    /// Files removed when the generation ends, whatever the outcome.
    pub artifacts: Option<ArtifactGuard>,
    pub outcome: CompletionSignal<GenerationOutcome>,
}

/// Spawn the waiter for one generation.
///
/// Ordering: the outcome is published only after the drainer has finished,
/// and artifacts are removed before the slot is cleared, so an observer that
/// sees `is_running() == false` also sees the files gone.
///
/// A compile generation leaves the slot alone when it exits: the
/// orchestrator either hands it to the program or releases it.
pub fn spawn_waiter(task: WaitTask) -> JoinHandle<GenerationOutcome> {
    tokio::spawn(async move {
        let generation = task.generation;
        let stage = task.stage;
        let outcome_tx = task.outcome;

        let outcome = wait_generation(
            generation,
            stage,
            task.child,
            task.killed,
            task.drained,
            &task.slot,
            task.artifacts,
        )
        .await;

        debug!(%generation, %stage, ?outcome, "exit waiter finished");
        outcome_tx.fire(outcome);
        outcome
    })
}

async fn wait_generation(
    generation: Generation,
    stage: Stage,
    mut child: Child,
    mut killed: watch::Receiver<bool>,
    drained: CompletionWaiter<bool>,
    slot: &ProcessSlot,
    artifacts: Option<ArtifactGuard>,
) -> GenerationOutcome {
    let status = tokio::select! {
        res = child.wait() => res,
        _ = killed.changed() => {
            terminate(generation, stage, &mut child).await;
            drop(artifacts);
            return GenerationOutcome::Killed;
        }
    };

    let code = match status {
        Ok(status) => {
            let code = status.code();
            info!(
                %generation,
                %stage,
                exit_code = code,
                success = status.success(),
                "process exited"
            );
            if !status.success() {
                report_failure(generation, stage, code);
            }
            code
        }
        Err(e) => {
            error!(%generation, %stage, error = %e, "waiting for process failed");
            terminate(generation, stage, &mut child).await;
            None
        }
    };

    // Output may still be in flight even though the process is gone.
    let fully_drained = tokio::select! {
        done = drained.wait() => done.unwrap_or(false),
        _ = killed.changed() => {
            debug!(%generation, %stage, "killed while waiting for output drain");
            drop(artifacts);
            return GenerationOutcome::Killed;
        }
    };

    drop(artifacts);
    if stage == Stage::Run {
        slot.clear_generation(generation);
    }

    if fully_drained {
        GenerationOutcome::Exited(code)
    } else {
        warn!(%generation, %stage, "output was not fully drained");
        GenerationOutcome::DrainFailed(code)
    }
}

fn report_failure(generation: Generation, stage: Stage, code: Option<i32>) {
    match stage {
        Stage::Compile => {
            let err = CxxrunError::CompileFailed(code);
            info!(%generation, error = %err, "compile stage failed");
        }
        Stage::Run => {
            let err = CxxrunError::ProcessExitNonZero(code);
            error!(%generation, error = %err, "run stage failed");
        }
    }
}

async fn terminate(generation: Generation, stage: Stage, child: &mut Child) {
    match child.kill().await {
        Ok(()) => info!(%generation, %stage, "process terminated"),
        Err(e) => warn!(
            %generation,
            %stage,
            error = %e,
            "failed to kill process; it may already have exited"
        ),
    }
}
