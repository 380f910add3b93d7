use crate::adapters::AdapterResult;
use crate::execution::{
    ProcessExecutor, ProcessExitStatus, ProcessOutput, ProcessSpawnRequest, spawn_validated,
};
use crate::models::{CoreError, CoreErrorKind, TaskId};

/// Runs a tool to completion. A non-zero exit becomes a `ToolExecution` error whose
/// message is the tool's own diagnostics, or the exit code when it printed nothing.
pub(crate) fn run_to_completion(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> AdapterResult<ProcessOutput> {
    let tool = request.tool;
    let task_id = request.task_id.clone();

    let process = spawn_validated(executor, request)?;

    let handle = tokio::runtime::Handle::current();
    let output: ProcessOutput = handle.block_on(process.wait())?;

    match output.status {
        ProcessExitStatus::ExitCode(0) => Ok(output),
        ProcessExitStatus::ExitCode(code) => {
            tracing::error!(
                tool = %tool,
                task_id = task_id.as_ref().map(TaskId::as_str),
                code,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "tool exited with failure"
            );
            Err(CoreError::new(
                CoreErrorKind::ToolExecution,
                failure_detail(&output, &format!("exit code {code}")),
            )
            .attribute(Some(tool), task_id.as_ref()))
        }
        ProcessExitStatus::Terminated => Err(CoreError::new(
            CoreErrorKind::ToolExecution,
            failure_detail(&output, "process was terminated by signal"),
        )
        .attribute(Some(tool), task_id.as_ref())),
    }
}

/// Best-effort version query; the banner may land on either stream.
pub(crate) fn run_and_collect_version_output(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> String {
    let Ok(process) = spawn_validated(executor, request) else {
        return String::new();
    };

    let handle = tokio::runtime::Handle::current();
    match handle.block_on(process.wait()) {
        Ok(output) => {
            let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
            text.push('\n');
            text.push_str(&String::from_utf8_lossy(&output.stderr));
            text
        }
        Err(_) => String::new(),
    }
}

fn failure_detail(output: &ProcessOutput, fallback: &str) -> String {
    [&output.stderr, &output.stdout]
        .into_iter()
        .map(|bytes| String::from_utf8_lossy(bytes))
        .find(|text| !text.trim().is_empty())
        .map(|text| text.into_owned())
        .unwrap_or_else(|| fallback.to_string())
}
