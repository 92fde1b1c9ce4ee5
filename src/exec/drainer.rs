// src/exec/drainer.rs

//! Output drainer: copies a generation's stdout and stderr into the console
//! sink until both reach end-of-stream.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, trace};

use crate::exec::signal::CompletionSignal;
use crate::exec::sink::ConsoleSink;
use crate::types::{Generation, Stage};

const CHUNK_SIZE: usize = 4096;

/// Why a drainer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainEnd {
    /// Both streams reached end-of-stream.
    Eof,
    /// The generation was killed or its slot entry went away.
    Cancelled,
    /// A read or sink write failed.
    Failed,
}

/// Everything one drainer needs, captured by value.
pub struct DrainTask {
    pub generation: Generation,
    pub stage: Stage,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
    pub killed: watch::Receiver<bool>,
    pub drained: CompletionSignal<bool>,
    pub sink: Arc<dyn ConsoleSink>,
}

/// Spawn the drainer for one generation.
///
/// The completion signal fires exactly once when the task ends: `true` on a
/// clean end-of-stream, `false` on cancellation or error.
pub fn spawn_drainer(task: DrainTask) -> JoinHandle<DrainEnd> {
    tokio::spawn(async move {
        let DrainTask {
            generation,
            stage,
            stdout,
            stderr,
            killed,
            drained,
            sink,
        } = task;

        let end = drain_streams(generation, stage, stdout, stderr, killed, sink.as_ref()).await;
        if !drained.fire(end == DrainEnd::Eof) {
            debug!(%generation, %stage, "drain signal was already fired");
        }
        debug!(%generation, %stage, ?end, "output drainer finished");
        end
    })
}

async fn drain_streams(
    generation: Generation,
    stage: Stage,
    mut stdout: Option<ChildStdout>,
    mut stderr: Option<ChildStderr>,
    mut killed: watch::Receiver<bool>,
    sink: &dyn ConsoleSink,
) -> DrainEnd {
    let mut out_buf = vec![0u8; CHUNK_SIZE];
    let mut err_buf = vec![0u8; CHUNK_SIZE];

    loop {
        if stdout.is_none() && stderr.is_none() {
            return DrainEnd::Eof;
        }

        tokio::select! {
            res = read_some(&mut stdout, &mut out_buf), if stdout.is_some() => {
                match forward(res, &out_buf, sink) {
                    Ok(true) => {}
                    Ok(false) => {
                        trace!(%generation, %stage, "stdout reached end-of-stream");
                        stdout = None;
                    }
                    Err(e) => {
                        error!(%generation, %stage, error = %e, "failed to drain stdout");
                        return DrainEnd::Failed;
                    }
                }
            }
            res = read_some(&mut stderr, &mut err_buf), if stderr.is_some() => {
                match forward(res, &err_buf, sink) {
                    Ok(true) => {}
                    Ok(false) => {
                        trace!(%generation, %stage, "stderr reached end-of-stream");
                        stderr = None;
                    }
                    Err(e) => {
                        error!(%generation, %stage, error = %e, "failed to drain stderr");
                        return DrainEnd::Failed;
                    }
                }
            }
            _ = killed.changed() => {
                debug!(%generation, %stage, "generation cancelled; abandoning output");
                return DrainEnd::Cancelled;
            }
        }
    }
}

async fn read_some<R>(reader: &mut Option<R>, buf: &mut [u8]) -> std::io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match reader.as_mut() {
        Some(r) => r.read(buf).await,
        None => Ok(0),
    }
}

/// Push a successful read into the sink. `Ok(false)` means end-of-stream.
fn forward(res: std::io::Result<usize>, buf: &[u8], sink: &dyn ConsoleSink) -> std::io::Result<bool> {
    let n = res?;
    if n == 0 {
        return Ok(false);
    }
    sink.write_chunk(&buf[..n])?;
    Ok(true)
}
