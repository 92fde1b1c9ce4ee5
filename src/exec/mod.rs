// src/exec/mod.rs

//! Process execution layer.
//!
//! This module owns everything that touches a child process, using
//! `tokio::process::Command`:
//!
//! - [`slot`] holds the single active process and its per-generation
//!   bindings.
//! - [`drainer`] copies a generation's output into the console sink.
//! - [`waiter`] waits for exit, then for the drainer, then clears the slot.
//! - [`signal`] is the single-fire completion primitive joining the two.
//! - [`sink`] is the console output abstraction.
//! - [`toolchain`] builds the compile/run commands from config.
//!
//! Failures inside the spawned drainer/waiter tasks are logged with
//! `tracing` and never propagated to the caller.

pub mod drainer;
pub mod signal;
pub mod sink;
pub mod slot;
pub mod toolchain;
pub mod waiter;

pub use drainer::{DrainEnd, DrainTask, spawn_drainer};
pub use signal::{CompletionSignal, CompletionWaiter, completion_signal};
pub use sink::{ConsoleSink, StdoutSink};
pub use slot::{GenerationHandles, InputHandle, ProcessSlot};
pub use toolchain::Toolchain;
pub use waiter::{WaitTask, spawn_waiter};
