use std::fmt;

/// Which half of a `compile_and_run` invocation a process belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Compile,
    Run,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Compile => f.write_str("compile"),
            Stage::Run => f.write_str("run"),
        }
    }
}

/// Identifier of one spawn-to-clear lifetime of a managed process.
///
/// Generations are handed out by the process slot in strictly increasing
/// order and never reused, so a stale waiter can always tell that the slot
/// has moved on without it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Final outcome of one generation, as decided by its exit waiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// Process exited and its output was fully drained.
    ///
    /// `None` means the process was terminated by a signal we did not send.
    Exited(Option<i32>),
    /// Process exited but draining its output stopped on a read error.
    DrainFailed(Option<i32>),
    /// `kill()` took the generation down before it finished.
    Killed,
}

impl GenerationOutcome {
    /// True only for a clean exit with status 0 and a complete drain.
    pub fn is_success(&self) -> bool {
        matches!(self, GenerationOutcome::Exited(Some(0)))
    }

    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GenerationOutcome::Exited(code) | GenerationOutcome::DrainFailed(code) => *code,
            GenerationOutcome::Killed => None,
        }
    }
}
