use std::fs::OpenOptions;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use crate::execution::{
    ExecutionResult, ProcessExecutor, ProcessExitStatus, ProcessOutput, ProcessSpawnRequest,
    ProcessWaitFuture, RunningProcess, StdoutTarget,
};
use crate::models::{CoreError, CoreErrorKind, TaskId, ToolId};

pub struct TokioProcessExecutor;

impl ProcessExecutor for TokioProcessExecutor {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>> {
        let mut cmd = tokio::process::Command::new(&request.command.program);
        cmd.args(&request.command.args);

        for (key, value) in &request.command.env {
            cmd.env(key, value);
        }

        let captures_stdout = match &request.stdout {
            StdoutTarget::Capture => {
                cmd.stdout(Stdio::piped());
                true
            }
            StdoutTarget::File(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(path)
                    .map_err(|error| {
                        CoreError::new(
                            CoreErrorKind::StorageFailure,
                            format!(
                                "failed to create output file '{}': {error}",
                                path.display()
                            ),
                        )
                        .attribute(Some(request.tool), request.task_id.as_ref())
                    })?;
                cmd.stdout(Stdio::from(file));
                false
            }
        };

        cmd.stdin(Stdio::null());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|error| {
            if let StdoutTarget::File(path) = &request.stdout {
                let _ = std::fs::remove_file(path);
            }
            CoreError::new(
                CoreErrorKind::ToolNotFound,
                format!(
                    "failed to start '{}' for {}: {error}",
                    request.command.program.display(),
                    request.tool
                ),
            )
            .attribute(Some(request.tool), request.task_id.as_ref())
        })?;

        let pid = child.id();
        let started_at = SystemTime::now();

        tracing::debug!(
            tool = %request.tool,
            task_id = request.task_id.as_ref().map(TaskId::as_str),
            pid,
            program = %request.command.program.display(),
            "spawned tool process"
        );

        Ok(Box::new(TokioRunningProcess {
            child: Mutex::new(Some(child)),
            pid,
            started_at,
            timeout: request.timeout,
            captures_stdout,
            tool: request.tool,
            task_id: request.task_id,
        }))
    }
}

struct TokioRunningProcess {
    child: Mutex<Option<tokio::process::Child>>,
    pid: Option<u32>,
    started_at: SystemTime,
    timeout: Option<Duration>,
    captures_stdout: bool,
    tool: ToolId,
    task_id: Option<TaskId>,
}

impl RunningProcess for TokioRunningProcess {
    fn pid(&self) -> Option<u32> {
        self.pid
    }

    fn wait(self: Box<Self>) -> ProcessWaitFuture {
        let child = self.child.into_inner().ok().flatten();
        let timeout = self.timeout;
        let started_at = self.started_at;
        let captures_stdout = self.captures_stdout;
        let tool = self.tool;
        let task_id = self.task_id;
        let pid = self.pid;

        Box::pin(async move {
            let mut child = child.ok_or_else(|| {
                process_failure(tool, task_id.as_ref(), "child process already consumed")
            })?;

            let stdout = OutputCollector::start(if captures_stdout {
                child.stdout.take()
            } else {
                None
            });
            let stderr = OutputCollector::start(child.stderr.take());

            let wait_err = |error: std::io::Error| {
                process_failure(
                    tool,
                    task_id.as_ref(),
                    &format!("failed to wait for process: {error}"),
                )
            };

            // Wait for exit first, then collect output with a short bounded read window,
            // since descendants may keep the pipes open after the tool itself exits.
            let status = if let Some(timeout_duration) = timeout {
                match tokio::time::timeout(timeout_duration, child.wait()).await {
                    Ok(result) => result.map_err(wait_err)?,
                    Err(_) => {
                        kill_process_group(pid);
                        let _ = child.start_kill();
                        let _ = tokio::time::timeout(Duration::from_secs(1), child.wait()).await;
                        stdout.abandon();
                        stderr.abandon();
                        return Err(process_failure(
                            tool,
                            task_id.as_ref(),
                            &format!(
                                "{tool} timed out after {}ms",
                                timeout_duration.as_millis()
                            ),
                        ));
                    }
                }
            } else {
                child.wait().await.map_err(wait_err)?
            };

            let read_deadline = Duration::from_millis(250);
            let stdout = stdout.finish(read_deadline).await;
            let stderr = stderr.finish(read_deadline).await;

            let finished_at = SystemTime::now();

            let status = match status.code() {
                Some(code) => ProcessExitStatus::ExitCode(code),
                None => ProcessExitStatus::Terminated,
            };

            Ok(ProcessOutput {
                status,
                stdout,
                stderr,
                started_at,
                finished_at,
            })
        })
    }
}

// Keeps what was read even if a descendant holds the pipe past the deadline.
struct OutputCollector {
    buffer: Arc<Mutex<Vec<u8>>>,
    reader: JoinHandle<()>,
}

impl OutputCollector {
    fn start<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buffer);
        let reader = tokio::spawn(async move {
            let Some(mut pipe) = pipe else {
                return;
            };
            let mut chunk = [0_u8; 8192];
            loop {
                match pipe.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(read) => {
                        if let Ok(mut buffer) = sink.lock() {
                            buffer.extend_from_slice(&chunk[..read]);
                        }
                    }
                }
            }
        });
        Self { buffer, reader }
    }

    async fn finish(mut self, deadline: Duration) -> Vec<u8> {
        let _ = tokio::time::timeout(deadline, &mut self.reader).await;
        self.reader.abort();
        self.buffer
            .lock()
            .map(|mut buffer| std::mem::take(&mut *buffer))
            .unwrap_or_default()
    }

    fn abandon(self) {
        self.reader.abort();
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        let pgid = -(pid as libc::pid_t);
        unsafe {
            libc::kill(pgid, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn process_failure(tool: ToolId, task_id: Option<&TaskId>, message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::ToolExecution, message).attribute(Some(tool), task_id)
}
