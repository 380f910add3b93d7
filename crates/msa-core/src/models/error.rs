use crate::models::{TaskId, ToolId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum CoreErrorKind {
    InvalidInput,
    InvalidTool,
    StorageFailure,
    NotFound,
    ToolNotFound,
    ToolExecution,
    Persistence,
    Internal,
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct CoreError {
    pub tool: Option<ToolId>,
    pub task: Option<TaskId>,
    pub kind: CoreErrorKind,
    pub message: String,
}

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            tool: None,
            task: None,
            kind,
            message: message.into(),
        }
    }

    pub fn with_tool(mut self, tool: ToolId) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_task(mut self, task: TaskId) -> Self {
        self.task = Some(task);
        self
    }

    /// Fills in tool and task attribution that the failing layer did not know about.
    pub fn attribute(self, tool: Option<ToolId>, task: Option<&TaskId>) -> Self {
        Self {
            tool: self.tool.or(tool),
            task: self.task.or_else(|| task.cloned()),
            kind: self.kind,
            message: self.message,
        }
    }
}
