#![cfg(unix)]

mod common;
use crate::common::*;

use std::error::Error;
use std::sync::Arc;

use cxxrun::errors::CxxrunError;
use cxxrun::types::GenerationOutcome;

type TestResult = Result<(), Box<dyn Error>>;

/// Killing a long-running program clears the slot at once, and the
/// generation (drainer included) still winds down in bounded time even
/// though a grandchild keeps the output pipes open.
#[tokio::test]
async fn kill_clears_slot_immediately_and_generation_terminates() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "forever.sh", SLEEP_FOREVER);
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&source)).await?;
    with_timeout(sink.wait_for_text("started\n")).await;
    assert!(orch.is_running());

    assert!(orch.kill());
    assert!(!orch.is_running());
    assert!(matches!(
        orch.send_input("too late").await,
        Err(CxxrunError::NoActiveProcess)
    ));

    let outcome = with_timeout(orch.wait_for_exit()).await;
    assert_eq!(outcome, Some(GenerationOutcome::Killed));
    assert!(!dir.path().join("prog").exists(), "binary is removed on kill too");
    Ok(())
}

#[tokio::test]
async fn kill_with_nothing_running_is_a_no_op() -> TestResult {
    init_tracing();
    let (orch, _sink) = shell_orchestrator().await;

    assert!(!orch.kill());
    assert!(!orch.is_running());
    Ok(())
}

#[tokio::test]
async fn kill_during_compile_aborts_the_run() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "slow.sh", "echo never\n");
    let cfg = ConfigFileBuilder::new()
        .with_compile_script("echo building; sleep 5")
        .build();
    let (orch, sink) = orchestrator_for(&cfg).await;
    let orch = Arc::new(orch);

    let compiling = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.compile_and_run(&source).await })
    };

    wait_for_compile_stage(&orch).await;
    with_timeout(sink.wait_for_text("building\n")).await;

    assert!(orch.kill());
    let res = with_timeout(compiling).await?;

    assert!(matches!(res, Err(CxxrunError::Killed)));
    assert!(!orch.is_running());
    assert!(!sink.contains("never"));
    Ok(())
}

#[tokio::test]
async fn new_program_can_start_after_kill() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let forever = write_source(dir.path(), "forever.sh", SLEEP_FOREVER);
    let quick = write_source(dir.path(), "quick.sh", "echo quick\n");
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&forever)).await?;
    orch.kill();
    with_timeout(orch.wait_for_exit()).await;

    with_timeout(orch.compile_and_run(&quick)).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    assert!(sink.contains("quick\n"));
    Ok(())
}
