use crate::models::{CoreError, CoreErrorKind, TaskId, TaskState, ToolId};
use crate::orchestration::OrchestrationResult;

/// Tracks one task through `Received -> Staged -> Running -> Completed | Failed`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskLifecycle {
    task_id: TaskId,
    tool: ToolId,
    state: TaskState,
}

impl TaskLifecycle {
    pub fn received(task_id: TaskId, tool: ToolId) -> Self {
        Self {
            task_id,
            tool,
            state: TaskState::Received,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn advance(&mut self, next: TaskState) -> OrchestrationResult<()> {
        if !is_allowed(self.state, next) {
            return Err(CoreError::new(
                CoreErrorKind::Internal,
                format!(
                    "task '{}' cannot transition from {:?} to {next:?}",
                    self.task_id, self.state
                ),
            )
            .with_tool(self.tool)
            .with_task(self.task_id.clone()));
        }

        tracing::debug!(
            task_id = self.task_id.as_str(),
            tool = %self.tool,
            from = ?self.state,
            to = ?next,
            "task state transition"
        );
        self.state = next;
        Ok(())
    }
}

fn is_allowed(from: TaskState, to: TaskState) -> bool {
    matches!(
        (from, to),
        (TaskState::Received, TaskState::Staged)
            | (TaskState::Received, TaskState::Rejected)
            | (TaskState::Received, TaskState::Failed)
            | (TaskState::Staged, TaskState::Running)
            | (TaskState::Staged, TaskState::Failed)
            | (TaskState::Running, TaskState::Completed)
            | (TaskState::Running, TaskState::Failed)
    )
}

#[cfg(test)]
mod tests {
    use super::TaskLifecycle;
    use crate::models::{CoreErrorKind, TaskId, TaskState, ToolId};

    fn lifecycle() -> TaskLifecycle {
        TaskLifecycle::received(TaskId::from_raw("t"), ToolId::Mafft)
    }

    #[test]
    fn happy_path_reaches_completed() {
        let mut task = lifecycle();
        task.advance(TaskState::Staged).unwrap();
        task.advance(TaskState::Running).unwrap();
        task.advance(TaskState::Completed).unwrap();
        assert_eq!(task.state(), TaskState::Completed);
    }

    #[test]
    fn terminal_states_are_final() {
        for terminal in [TaskState::Completed, TaskState::Failed] {
            let mut task = lifecycle();
            task.advance(TaskState::Staged).unwrap();
            task.advance(TaskState::Running).unwrap();
            task.advance(terminal).unwrap();

            for next in [
                TaskState::Received,
                TaskState::Staged,
                TaskState::Running,
                TaskState::Completed,
                TaskState::Failed,
            ] {
                let error = task.clone().advance(next).unwrap_err();
                assert_eq!(error.kind, CoreErrorKind::Internal);
            }
        }
    }

    #[test]
    fn running_requires_staging_first() {
        let mut task = lifecycle();
        assert!(task.advance(TaskState::Running).is_err());
        assert_eq!(task.state(), TaskState::Received);
    }
}
