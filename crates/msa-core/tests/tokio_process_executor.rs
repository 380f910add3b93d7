#![cfg(unix)]

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use msa_core::execution::{
    CommandSpec, ProcessExitStatus, ProcessSpawnRequest, TokioProcessExecutor, spawn_validated,
};
use msa_core::models::{CoreErrorKind, TaskId, ToolId};

fn scratch_dir(test_name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("msa-exec-{test_name}-{nanos}"));
    std::fs::create_dir_all(&dir).expect("scratch dir should be creatable");
    dir
}

fn shell_request(script: &str) -> ProcessSpawnRequest {
    ProcessSpawnRequest::new(
        ToolId::Mafft,
        CommandSpec::new("/bin/sh").args(["-c", script]),
    )
}

#[tokio::test]
async fn spawns_echo_and_captures_stdout() {
    let executor = TokioProcessExecutor;
    let request =
        ProcessSpawnRequest::new(ToolId::Mafft, CommandSpec::new("/bin/echo").arg("hello"));
    let handle = spawn_validated(&executor, request).expect("spawn should succeed");

    assert!(handle.pid().is_some());

    let output = handle.wait().await.expect("wait should succeed");
    assert_eq!(output.status, ProcessExitStatus::ExitCode(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    assert!(output.started_at <= output.finished_at);
}

#[tokio::test]
async fn captures_nonzero_exit_code_and_stderr() {
    let executor = TokioProcessExecutor;
    let handle = spawn_validated(&executor, shell_request("echo 'bad input' >&2; exit 3"))
        .expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.status, ProcessExitStatus::ExitCode(3));
    assert_eq!(String::from_utf8_lossy(&output.stderr), "bad input\n");
}

#[tokio::test]
async fn stdout_is_redirected_into_new_file() {
    let dir = scratch_dir("redirect");
    let target = dir.join("result.aln");
    let executor = TokioProcessExecutor;
    let request = shell_request("printf '>a\\nACGT\\n'").stdout_to_file(&target);

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.status, ProcessExitStatus::ExitCode(0));
    assert!(output.stdout.is_empty());
    assert_eq!(std::fs::read_to_string(&target).unwrap(), ">a\nACGT\n");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn existing_redirect_target_is_not_overwritten() {
    let dir = scratch_dir("existing");
    let target = dir.join("result.aln");
    std::fs::write(&target, "keep").unwrap();

    let executor = TokioProcessExecutor;
    let request = shell_request("echo replaced").stdout_to_file(&target);
    let error = match spawn_validated(&executor, request) {
        Err(error) => error,
        Ok(_) => panic!("expected redirect into existing file to fail"),
    };

    assert_eq!(error.kind, CoreErrorKind::StorageFailure);
    assert_eq!(std::fs::read_to_string(&target).unwrap(), "keep");

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn timeout_kills_long_running_process() {
    let executor = TokioProcessExecutor;
    let task_id = TaskId::generate();
    let request = ProcessSpawnRequest::new(ToolId::Muscle, CommandSpec::new("/bin/sleep").arg("30"))
        .task_id(task_id.clone())
        .timeout(Duration::from_millis(100));

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let error = handle.wait().await.expect_err("should time out");

    assert_eq!(error.kind, CoreErrorKind::ToolExecution);
    assert_eq!(error.tool, Some(ToolId::Muscle));
    assert_eq!(error.task, Some(task_id));
    assert!(error.message.contains("timed out"));
}

#[tokio::test]
async fn spawn_nonexistent_program_reports_tool_not_found() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(ToolId::Muscle, CommandSpec::new("/nonexistent/muscle"));

    let error = match spawn_validated(&executor, request) {
        Err(error) => error,
        Ok(_) => panic!("expected spawn to fail for nonexistent binary"),
    };

    assert_eq!(error.kind, CoreErrorKind::ToolNotFound);
    assert_eq!(error.tool, Some(ToolId::Muscle));
}

#[tokio::test]
async fn failed_spawn_removes_redirect_target() {
    let dir = scratch_dir("failed-spawn");
    let target = dir.join("result.aln");
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(ToolId::Mafft, CommandSpec::new("/nonexistent/mafft"))
        .stdout_to_file(&target);

    let error = match spawn_validated(&executor, request) {
        Err(error) => error,
        Ok(_) => panic!("expected spawn to fail for nonexistent binary"),
    };

    assert_eq!(error.kind, CoreErrorKind::ToolNotFound);
    assert!(!target.exists());

    let _ = std::fs::remove_dir_all(dir);
}

#[tokio::test]
async fn stderr_survives_descendant_holding_the_pipe() {
    let executor = TokioProcessExecutor;
    let handle = spawn_validated(&executor, shell_request("echo diag >&2; sleep 5 & exit 1"))
        .expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.status, ProcessExitStatus::ExitCode(1));
    assert_eq!(String::from_utf8_lossy(&output.stderr), "diag\n");
}

#[tokio::test]
async fn env_vars_are_passed_to_child() {
    let executor = TokioProcessExecutor;
    let request = ProcessSpawnRequest::new(
        ToolId::Mafft,
        CommandSpec::new("/usr/bin/env").env("MSA_TEST_VAR", "test_value_42"),
    );

    let handle = spawn_validated(&executor, request).expect("spawn should succeed");
    let output = handle.wait().await.expect("wait should succeed");

    assert_eq!(output.status, ProcessExitStatus::ExitCode(0));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("MSA_TEST_VAR=test_value_42"),
        "expected env var in output, got: {stdout}"
    );
}
