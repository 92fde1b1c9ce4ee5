#![cfg(unix)]

mod common;
use crate::common::*;

use std::error::Error;
use std::sync::Arc;

use cxxrun::engine::Orchestrator;
use cxxrun::errors::CxxrunError;
use cxxrun::types::{GenerationOutcome, Stage};

type TestResult = Result<(), Box<dyn Error>>;

/// The three-line echo scenario: prompts and echoes interleave in order,
/// and once the program exits the slot is empty and the binary is gone.
#[tokio::test]
async fn echo_program_receives_three_lines_in_order() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "bb.sh", ECHO_THREE);
    let (orch, sink) = shell_orchestrator().await;

    assert!(!orch.is_running());
    let generation = with_timeout(orch.compile_and_run(&source)).await?;

    // Program blocks on its first read, so it must still be active.
    assert!(orch.is_running());
    assert_eq!(orch.active(), Some((generation, Stage::Run)));

    for value in ["1", "2", "3"] {
        with_timeout(sink.wait_for_text(&format!("enter value {value}:"))).await;
        orch.send_input(value).await?;
    }

    let outcome = with_timeout(orch.wait_for_exit()).await;
    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    assert!(!orch.is_running());

    let expected = "enter value 1:\ngot 1\nenter value 2:\ngot 2\nenter value 3:\ngot 3\n";
    assert!(
        sink.text().ends_with(expected),
        "unexpected console output: {:?}",
        sink.text()
    );

    assert!(!dir.path().join("prog").exists(), "binary should be removed");
    assert!(source.exists(), "caller's source file must be left alone");
    Ok(())
}

#[tokio::test]
async fn compiler_output_is_delivered_before_program_output() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "hello.sh", "echo hello from program\n");
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&source)).await?;
    with_timeout(orch.wait_for_exit()).await;

    let text = sink.text();
    let compiled = text.find("compiling hello.sh").ok_or("missing compiler output")?;
    let ran = text.find("hello from program").ok_or("missing program output")?;
    assert!(compiled < ran, "compiler output must come first: {text:?}");
    Ok(())
}

#[tokio::test]
async fn output_order_is_preserved_for_many_lines() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let body = "i=1\nwhile [ $i -le 300 ]; do echo \"line $i\"; i=$((i+1)); done\n";
    let source = write_source(dir.path(), "count.sh", body);
    let (orch, sink) =
        orchestrator_for(&ConfigFileBuilder::quiet_shell_toolchain().build()).await;

    with_timeout(orch.compile_and_run(&source)).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;
    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));

    let expected: String = (1..=300).map(|i| format!("line {i}\n")).collect();
    assert_eq!(sink.text(), expected);
    Ok(())
}

#[tokio::test]
async fn stderr_is_forwarded_to_the_same_sink() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "both.sh", "echo to-stdout\necho to-stderr >&2\n");
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&source)).await?;
    with_timeout(orch.wait_for_exit()).await;

    assert!(sink.contains("to-stdout\n"));
    assert!(sink.contains("to-stderr\n"));
    Ok(())
}

/// Non-zero program exit is only logged; the generation still drains,
/// clears the slot and removes the binary.
#[tokio::test]
async fn nonzero_program_exit_still_cleans_up() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "fail.sh", "echo bye\nexit 3\n");
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&source)).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(3))));
    assert!(!orch.is_running());
    assert!(sink.contains("bye\n"));
    assert!(!dir.path().join("prog").exists());
    Ok(())
}

#[tokio::test]
async fn closing_input_lets_program_reading_to_eof_finish() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "cat.sh", ECHO_UNTIL_EOF);
    let (orch, sink) = shell_orchestrator().await;

    with_timeout(orch.compile_and_run(&source)).await?;
    orch.send_input("a").await?;
    orch.send_input("b c").await?;
    orch.close_input().await?;
    // Closing twice is harmless; the program may already be gone.
    let _ = orch.close_input().await;

    let outcome = with_timeout(orch.wait_for_exit()).await;
    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    assert!(sink.text().ends_with("echo:a\necho:b c\ndone\n"));
    Ok(())
}

#[tokio::test]
async fn inline_code_is_written_compiled_and_removed() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let cfg = ConfigFileBuilder::shell_toolchain()
        .with_scratch_dir(dir.path())
        .build();
    let (orch, sink) = orchestrator_for(&cfg).await;

    with_timeout(orch.compile_and_run_code("echo inline-ok\n")).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    assert!(sink.contains("compiling program.sh"));
    assert!(sink.contains("inline-ok\n"));
    assert!(!dir.path().join("program.sh").exists(), "scratch source should be removed");
    assert!(!dir.path().join("prog").exists());
    Ok(())
}

#[tokio::test]
async fn keep_artifacts_leaves_binary_on_disk() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "keep.sh", "echo kept\n");
    let cfg = ConfigFileBuilder::shell_toolchain()
        .keep_artifacts(true)
        .with_binary_name("kept-prog")
        .build();
    let (orch, _sink) = orchestrator_for(&cfg).await;

    with_timeout(orch.compile_and_run(&source)).await?;
    with_timeout(orch.wait_for_exit()).await;

    assert!(dir.path().join("kept-prog").exists());
    Ok(())
}

/// A drain error is logged, not propagated; the waiter still clears the slot.
#[tokio::test]
async fn drain_failure_is_reported_through_outcome_only() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "noisy.sh", "echo lost\n");
    let cfg = ConfigFileBuilder::quiet_shell_toolchain().build();
    let orch = Orchestrator::new(&cfg, Arc::new(FailingSink)).await?;

    with_timeout(orch.compile_and_run(&source)).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert_eq!(outcome, Some(GenerationOutcome::DrainFailed(Some(0))));
    assert!(!orch.is_running());
    assert!(!dir.path().join("prog").exists());
    Ok(())
}

#[tokio::test]
async fn orchestrator_can_run_again_after_previous_program_ends() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let first = write_source(dir.path(), "first.sh", "echo first\n");
    let second = write_source(dir.path(), "second.sh", "echo second\n");
    let (orch, sink) = shell_orchestrator().await;

    let g1 = with_timeout(orch.compile_and_run(&first)).await?;
    with_timeout(orch.wait_for_exit()).await;
    let g2 = with_timeout(orch.compile_and_run(&second)).await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert!(g2 > g1, "generations are never reused");
    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    let text = sink.text();
    let first_at = text.find("first\n").ok_or("missing first output")?;
    let second_at = text.find("second\n").ok_or("missing second output")?;
    assert!(first_at < second_at);
    Ok(())
}

#[tokio::test]
async fn program_counts_as_running_only_after_compile_finishes() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let source = write_source(dir.path(), "cat.sh", ECHO_UNTIL_EOF);
    let (orch, sink) =
        orchestrator_for(&ConfigFileBuilder::slow_shell_toolchain().build()).await;
    let orch = Arc::new(orch);

    let compiling = {
        let orch = Arc::clone(&orch);
        tokio::spawn(async move { orch.compile_and_run(&source).await })
    };
    wait_for_compile_stage(&orch).await;

    assert!(!orch.is_running());
    assert!(matches!(
        orch.send_input("early").await,
        Err(CxxrunError::NoActiveProcess)
    ));

    let generation = with_timeout(compiling).await??;
    assert!(orch.is_running());
    assert_eq!(orch.active(), Some((generation, Stage::Run)));

    orch.send_input("late").await?;
    orch.close_input().await?;
    let outcome = with_timeout(orch.wait_for_exit()).await;

    assert_eq!(outcome, Some(GenerationOutcome::Exited(Some(0))));
    assert_eq!(sink.text(), "echo:late\ndone\n");
    Ok(())
}
