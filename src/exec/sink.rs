// src/exec/sink.rs

//! Destination for process output.
//!
//! Every drainer of every generation writes into the same sink, so
//! implementations must accept concurrent writers and forward bytes as they
//! arrive.

use std::io::{self, Write};

/// Shared console-like output sink.
pub trait ConsoleSink: Send + Sync {
    /// Forward one chunk. Must not reorder or transcode bytes.
    fn write_chunk(&self, bytes: &[u8]) -> io::Result<()>;
}

/// Production sink: the caller's own stdout, flushed after every chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl ConsoleSink for StdoutSink {
    fn write_chunk(&self, bytes: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        out.flush()
    }
}
