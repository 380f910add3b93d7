use std::sync::Arc;

use crate::adapters::{ToolAdapter, ToolRequest};
use crate::artifacts::{ArtifactRef, ArtifactStore};
use crate::models::{
    CoreError, CoreErrorKind, NewHistoryRecord, SessionId, TaskId, TaskStamp, TaskState, ToolId,
};
use crate::orchestration::lifecycle::TaskLifecycle;
use crate::orchestration::{
    HISTORY_PAGE_SIZE, HistoryView, NoopProgress, OrchestrationResult, ProgressSink,
    ProgressStage, SubmitRequest, TaskOutcome,
};
use crate::persistence::HistoryStore;
use crate::session::{SessionContext, SessionRegistry};

#[derive(Clone)]
pub struct TaskOrchestrator {
    sessions: SessionRegistry,
    artifacts: Arc<dyn ArtifactStore>,
    adapter: Arc<dyn ToolAdapter>,
    history: Arc<dyn HistoryStore>,
}

impl TaskOrchestrator {
    pub fn new(
        artifacts: Arc<dyn ArtifactStore>,
        adapter: Arc<dyn ToolAdapter>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            sessions: SessionRegistry::new(),
            artifacts,
            adapter,
            history,
        }
    }

    pub fn artifacts(&self) -> &Arc<dyn ArtifactStore> {
        &self.artifacts
    }

    pub async fn submit(&self, request: SubmitRequest) -> TaskOutcome {
        self.submit_with_progress(request, Arc::new(NoopProgress))
            .await
    }

    pub async fn submit_with_progress(
        &self,
        request: SubmitRequest,
        progress: Arc<dyn ProgressSink>,
    ) -> TaskOutcome {
        let SubmitRequest {
            file,
            tool,
            session,
        } = request;

        let Some(file) = file.filter(|bytes| !bytes.is_empty()) else {
            tracing::info!("rejected submission without a file");
            return TaskOutcome::rejected(session, "Error: no file supplied", None);
        };

        let tool = match tool.parse::<ToolId>() {
            Ok(tool) => tool,
            Err(error) => {
                tracing::info!(requested = %tool, "rejected submission for unsupported tool");
                return TaskOutcome::rejected(
                    session,
                    "Error: invalid alignment tool",
                    Some(error),
                );
            }
        };

        let resolved = self.sessions.resolve_or_create(&session);
        let session_id = resolved.session_id;
        let context = resolved.context;
        let task_id = TaskId::generate();

        tracing::info!(
            task_id = task_id.as_str(),
            session_id = session_id.as_str(),
            tool = %tool,
            bytes = file.len(),
            "accepted alignment task"
        );

        // Detached so a dropped caller cannot strand the task short of a terminal state.
        let orchestrator = self.clone();
        let accepted = AcceptedTask {
            task_id: task_id.clone(),
            tool,
            session_id,
            context: context.clone(),
            file,
        };
        let running = tokio::spawn(async move { orchestrator.execute(accepted, progress).await });
        match running.await {
            Ok(outcome) => outcome,
            Err(join_error) => {
                tracing::error!(
                    task_id = task_id.as_str(),
                    error = %join_error,
                    "alignment task aborted"
                );
                TaskOutcome {
                    state: TaskState::Failed,
                    task_id: Some(task_id),
                    session: context,
                    status: "Error: alignment failed unexpectedly".to_string(),
                    result_text: format!("Unexpected error during alignment: {join_error}"),
                    artifact: None,
                    detail: Some(join_error.to_string()),
                    error_kind: Some(CoreErrorKind::Internal),
                }
            }
        }
    }

    async fn execute(
        &self,
        accepted: AcceptedTask,
        progress: Arc<dyn ProgressSink>,
    ) -> TaskOutcome {
        let AcceptedTask {
            task_id,
            tool,
            session_id,
            context,
            file,
        } = accepted;
        let mut task = TaskLifecycle::received(task_id, tool);

        match self
            .drive(&mut task, tool, &session_id, file, progress.as_ref())
            .await
        {
            Ok(completed) => {
                progress.report(task.task_id(), ProgressStage::Completed);
                TaskOutcome {
                    state: task.state(),
                    task_id: Some(task.task_id().clone()),
                    session: context,
                    status: format!("Alignment completed ({tool})."),
                    result_text: completed.result_text,
                    artifact: Some(completed.output),
                    detail: None,
                    error_kind: None,
                }
            }
            Err(failure) => {
                let error = failure.error.attribute(Some(tool), Some(task.task_id()));
                if task.advance(TaskState::Failed).is_err() {
                    tracing::error!(
                        task_id = task.task_id().as_str(),
                        state = ?task.state(),
                        "failure reported for task already in a terminal state"
                    );
                }
                tracing::error!(
                    task_id = task.task_id().as_str(),
                    session_id = session_id.as_str(),
                    tool = %tool,
                    phase = ?failure.phase,
                    kind = ?error.kind,
                    message = %error.message,
                    "alignment task failed"
                );
                TaskOutcome {
                    state: TaskState::Failed,
                    task_id: Some(task.task_id().clone()),
                    session: context,
                    status: failure.phase.status(tool, &error),
                    result_text: failure.phase.result_text(tool, &error),
                    artifact: None,
                    detail: Some(error.message.clone()),
                    error_kind: Some(error.kind),
                }
            }
        }
    }

    async fn drive(
        &self,
        task: &mut TaskLifecycle,
        tool: ToolId,
        session_id: &SessionId,
        file: Vec<u8>,
        progress: &dyn ProgressSink,
    ) -> Result<CompletedRun, PhaseFailure> {
        let task_id = task.task_id().clone();
        let stamp = TaskStamp::now().map_err(PhaseFailure::staging)?;

        progress.report(&task_id, ProgressStage::Preparing);
        let paths = self.artifacts.allocate(&task_id, &stamp);
        let staged_paths = paths.clone();
        let artifacts = self.artifacts.clone();
        let input = run_blocking(move || artifacts.stage_input(&staged_paths, &file))
            .await
            .map_err(PhaseFailure::staging)?;
        task.advance(TaskState::Staged)
            .map_err(PhaseFailure::staging)?;

        progress.report(&task_id, ProgressStage::Running);
        task.advance(TaskState::Running).map_err(PhaseFailure::tool)?;
        let adapter = self.adapter.clone();
        let tool_request = ToolRequest {
            tool,
            task_id: task_id.clone(),
            input: input.clone(),
            output: paths.output.clone(),
        };
        let output = run_blocking(move || adapter.invoke(tool_request))
            .await
            .map_err(PhaseFailure::tool)?;

        progress.report(&task_id, ProgressStage::ReadingResult);
        let artifacts = self.artifacts.clone();
        let read_target = output.clone();
        let bytes = run_blocking(move || artifacts.read_output(&read_target))
            .await
            .map_err(PhaseFailure::reading)?;
        let result_text = String::from_utf8_lossy(&bytes).into_owned();
        task.advance(TaskState::Completed)
            .map_err(PhaseFailure::reading)?;
        tracing::info!(
            task_id = task_id.as_str(),
            output = %output.display(),
            bytes = bytes.len(),
            "read alignment result"
        );

        self.record_history(NewHistoryRecord {
            session_id: session_id.clone(),
            task_id,
            tool,
            input_file: input.display(),
            output_file: output.display(),
            timestamp: stamp.iso8601,
        })
        .await;

        Ok(CompletedRun {
            output,
            result_text,
        })
    }

    /// The task already succeeded; a ledger failure is logged and never surfaced.
    async fn record_history(&self, record: NewHistoryRecord) {
        let history = self.history.clone();
        let task_id = record.task_id.clone();
        let session_id = record.session_id.clone();

        match run_blocking(move || history.append(&record)).await {
            Ok(saved) => tracing::info!(
                task_id = task_id.as_str(),
                session_id = session_id.as_str(),
                history_id = saved.id,
                "saved task to history"
            ),
            Err(error) => tracing::error!(
                task_id = task_id.as_str(),
                session_id = session_id.as_str(),
                kind = ?error.kind,
                message = %error.message,
                "failed to save task to history"
            ),
        }
    }

    pub async fn list_recent(&self, context: &SessionContext) -> HistoryView {
        self.list_recent_with_limit(context, HISTORY_PAGE_SIZE)
            .await
    }

    pub async fn list_recent_with_limit(
        &self,
        context: &SessionContext,
        limit: usize,
    ) -> HistoryView {
        let Some(session_id) = self.sessions.resolve(context) else {
            return HistoryView::NoSession;
        };

        let history = self.history.clone();
        let query_session = session_id.clone();
        match run_blocking(move || history.query(&query_session, limit)).await {
            Ok(records) if records.is_empty() => HistoryView::Empty { session_id },
            Ok(records) => HistoryView::Rows {
                session_id,
                records,
            },
            Err(error) => {
                tracing::error!(
                    session_id = session_id.as_str(),
                    kind = ?error.kind,
                    message = %error.message,
                    "failed to load history"
                );
                HistoryView::Unavailable {
                    message: error.message,
                }
            }
        }
    }
}

struct AcceptedTask {
    task_id: TaskId,
    tool: ToolId,
    session_id: SessionId,
    context: SessionContext,
    file: Vec<u8>,
}

struct CompletedRun {
    output: ArtifactRef,
    result_text: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Staging,
    Tool,
    Reading,
}

impl Phase {
    fn status(self, tool: ToolId, error: &CoreError) -> String {
        match (self, error.kind) {
            (Self::Staging, _) => "Error: failed to save uploaded file".to_string(),
            (Self::Tool, CoreErrorKind::ToolNotFound) => format!("Error: {tool} not found"),
            (Self::Tool, CoreErrorKind::ToolExecution) => format!("Error: {tool} run failed"),
            (Self::Tool, _) => "Error: alignment failed unexpectedly".to_string(),
            (Self::Reading, _) => "Error: failed to read alignment result".to_string(),
        }
    }

    fn result_text(self, tool: ToolId, error: &CoreError) -> String {
        match (self, error.kind) {
            (Self::Staging, _) => format!("Error while handling the uploaded file: {}", error.message),
            (Self::Tool, CoreErrorKind::ToolNotFound) => format!(
                "Error: {}. Make sure {tool} is installed and added to PATH.",
                error.message
            ),
            (Self::Tool, CoreErrorKind::ToolExecution) => {
                format!("{tool} failed.\nError output:\n{}", error.message)
            }
            (Self::Tool, _) => format!("Unexpected error during alignment: {}", error.message),
            (Self::Reading, _) => {
                "Alignment succeeded, but reading the result file failed.".to_string()
            }
        }
    }
}

struct PhaseFailure {
    phase: Phase,
    error: CoreError,
}

impl PhaseFailure {
    fn staging(error: CoreError) -> Self {
        Self {
            phase: Phase::Staging,
            error,
        }
    }

    fn tool(error: CoreError) -> Self {
        Self {
            phase: Phase::Tool,
            error,
        }
    }

    fn reading(error: CoreError) -> Self {
        Self {
            phase: Phase::Reading,
            error,
        }
    }
}

async fn run_blocking<T>(
    operation: impl FnOnce() -> OrchestrationResult<T> + Send + 'static,
) -> OrchestrationResult<T>
where
    T: Send + 'static,
{
    tokio::task::spawn_blocking(operation)
        .await
        .map_err(|join_error| {
            CoreError::new(
                CoreErrorKind::Internal,
                format!("blocking task join failure: {join_error}"),
            )
        })?
}
