#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use cxxrun_test_utils::{
    init_tracing, with_timeout, ConfigFileBuilder, FailingSink, MemorySink,
};

use cxxrun::config::ConfigFile;
use cxxrun::engine::Orchestrator;
use cxxrun::types::Stage;

/// Write a shell "source file" into `dir`.
pub fn write_source(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("writing test source");
    path
}

/// Orchestrator over the shell toolchain, capturing output in a `MemorySink`.
pub async fn shell_orchestrator() -> (Orchestrator, MemorySink) {
    orchestrator_for(&ConfigFileBuilder::shell_toolchain().build()).await
}

pub async fn orchestrator_for(cfg: &ConfigFile) -> (Orchestrator, MemorySink) {
    let sink = MemorySink::new();
    let orchestrator = Orchestrator::new(cfg, Arc::new(sink.clone()))
        .await
        .expect("shell toolchain should be available");
    (orchestrator, sink)
}

/// Poll until the compiler holds the slot.
pub async fn wait_for_compile_stage(orch: &Orchestrator) {
    with_timeout(async {
        while !matches!(orch.active(), Some((_, Stage::Compile))) {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
}

/// Reads three lines, prompting before and echoing after each one.
pub const ECHO_THREE: &str = r#"for i in 1 2 3; do
  echo "enter value $i:"
  read line
  echo "got $line"
done
"#;

/// Never finishes on its own; `sleep` is a grandchild holding the pipes.
pub const SLEEP_FOREVER: &str = r#"echo started
while true; do sleep 1; done
"#;

/// Echoes input until end-of-input.
pub const ECHO_UNTIL_EOF: &str = r#"while read line; do echo "echo:$line"; done
echo done
"#;
