pub mod tokio_process;

pub use tokio_process::TokioProcessExecutor;

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::{Duration, SystemTime};

use crate::models::{CoreError, CoreErrorKind, TaskId, ToolId};

pub type ExecutionResult<T> = Result<T, CoreError>;

pub type ProcessWaitFuture = Pin<Box<dyn Future<Output = ExecutionResult<ProcessOutput>> + Send>>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn validate(&self, tool: ToolId) -> ExecutionResult<()> {
        if self.program.as_os_str().is_empty() {
            return Err(invalid_input(tool, "command program path must not be empty"));
        }

        if self
            .args
            .iter()
            .any(|arg| arg.is_empty() || arg.contains('\0'))
        {
            return Err(invalid_input(
                tool,
                "command args must be non-empty and must not contain NUL bytes",
            ));
        }

        if self
            .env
            .iter()
            .any(|(key, value)| key.is_empty() || key.contains('\0') || value.contains('\0'))
        {
            return Err(invalid_input(
                tool,
                "environment keys and values must be non-empty and must not contain NUL bytes",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StdoutTarget {
    Capture,
    File(PathBuf),
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessSpawnRequest {
    pub tool: ToolId,
    pub task_id: Option<TaskId>,
    pub command: CommandSpec,
    pub stdout: StdoutTarget,
    pub timeout: Option<Duration>,
    pub requested_at: SystemTime,
}

impl ProcessSpawnRequest {
    pub fn new(tool: ToolId, command: CommandSpec) -> Self {
        Self {
            tool,
            task_id: None,
            command,
            stdout: StdoutTarget::Capture,
            timeout: None,
            requested_at: SystemTime::now(),
        }
    }

    pub fn task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn stdout_to_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout = StdoutTarget::File(path.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn validate(&self) -> ExecutionResult<()> {
        self.command.validate(self.tool)?;

        if let Some(timeout) = self.timeout
            && timeout.is_zero()
        {
            return Err(invalid_input(
                self.tool,
                "timeout must be greater than zero when provided",
            ));
        }

        if let StdoutTarget::File(path) = &self.stdout
            && path.as_os_str().is_empty()
        {
            return Err(invalid_input(
                self.tool,
                "stdout redirect path must not be empty",
            ));
        }

        Ok(())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProcessExitStatus {
    ExitCode(i32),
    Terminated,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProcessOutput {
    pub status: ProcessExitStatus,
    /// Empty when stdout was redirected to a file.
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub started_at: SystemTime,
    pub finished_at: SystemTime,
}

pub trait RunningProcess: Send + Sync {
    fn pid(&self) -> Option<u32>;

    fn wait(self: Box<Self>) -> ProcessWaitFuture;
}

pub trait ProcessExecutor: Send + Sync {
    fn spawn(&self, request: ProcessSpawnRequest) -> ExecutionResult<Box<dyn RunningProcess>>;
}

pub fn spawn_validated(
    executor: &dyn ProcessExecutor,
    request: ProcessSpawnRequest,
) -> ExecutionResult<Box<dyn RunningProcess>> {
    request.validate()?;
    executor.spawn(request)
}

fn invalid_input(tool: ToolId, message: &str) -> CoreError {
    CoreError::new(CoreErrorKind::InvalidInput, message).with_tool(tool)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{CommandSpec, ProcessSpawnRequest, StdoutTarget};
    use crate::models::{CoreErrorKind, ToolId};

    #[test]
    fn empty_program_is_rejected() {
        let request = ProcessSpawnRequest::new(ToolId::Mafft, CommandSpec::new(""));
        let error = request.validate().unwrap_err();
        assert_eq!(error.kind, CoreErrorKind::InvalidInput);
        assert_eq!(error.tool, Some(ToolId::Mafft));
    }

    #[test]
    fn nul_bytes_in_args_are_rejected() {
        let request =
            ProcessSpawnRequest::new(ToolId::Muscle, CommandSpec::new("muscle").arg("-in\0x"));
        assert_eq!(
            request.validate().unwrap_err().kind,
            CoreErrorKind::InvalidInput
        );
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let request = ProcessSpawnRequest::new(ToolId::Mafft, CommandSpec::new("mafft"))
            .timeout(Duration::ZERO);
        assert_eq!(
            request.validate().unwrap_err().kind,
            CoreErrorKind::InvalidInput
        );
    }

    #[test]
    fn stdout_redirect_is_recorded() {
        let request = ProcessSpawnRequest::new(ToolId::Mafft, CommandSpec::new("mafft"))
            .stdout_to_file("/tmp/out.aln");
        assert_eq!(request.stdout, StdoutTarget::File("/tmp/out.aln".into()));
        assert!(request.validate().is_ok());
    }
}
