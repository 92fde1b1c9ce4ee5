// src/engine/mod.rs

//! Orchestration engine for cxxrun.
//!
//! [`Orchestrator`] sequences the two stages of a `compile_and_run` call on
//! top of the execution layer in [`crate::exec`]: compile, wait for exit and
//! drain, then launch the program as a detached generation that the caller
//! can feed input to until it exits or is killed.

pub mod orchestrator;

pub use orchestrator::Orchestrator;
