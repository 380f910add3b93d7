pub mod history_view;
pub mod lifecycle;
pub mod orchestrator;
pub mod progress;

pub use history_view::HistoryView;
pub use lifecycle::TaskLifecycle;
pub use orchestrator::TaskOrchestrator;
pub use progress::{NoopProgress, ProgressSink, ProgressStage};

use crate::artifacts::ArtifactRef;
use crate::models::{CoreError, CoreErrorKind, TaskId, TaskState};
use crate::session::SessionContext;

pub type OrchestrationResult<T> = Result<T, CoreError>;

pub const HISTORY_PAGE_SIZE: usize = 20;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubmitRequest {
    pub file: Option<Vec<u8>>,
    pub tool: String,
    pub session: SessionContext,
}

impl SubmitRequest {
    pub fn new(file: Option<Vec<u8>>, tool: impl Into<String>, session: SessionContext) -> Self {
        Self {
            file,
            tool: tool.into(),
            session,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskOutcome {
    pub state: TaskState,
    /// `None` when the submission was rejected before a task existed.
    pub task_id: Option<TaskId>,
    pub session: SessionContext,
    pub status: String,
    pub result_text: String,
    pub artifact: Option<ArtifactRef>,
    /// Failure text exactly as the failing component reported it.
    pub detail: Option<String>,
    pub error_kind: Option<CoreErrorKind>,
}

impl TaskOutcome {
    pub(crate) fn rejected(
        session: SessionContext,
        status: &str,
        error: Option<CoreError>,
    ) -> Self {
        let (result_text, detail, error_kind) = match error {
            Some(error) => (error.message.clone(), Some(error.message), Some(error.kind)),
            None => (status.to_string(), None, Some(CoreErrorKind::InvalidInput)),
        };

        Self {
            state: TaskState::Rejected,
            task_id: None,
            session,
            status: status.to_string(),
            result_text,
            artifact: None,
            detail,
            error_kind,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.state == TaskState::Completed
    }
}
