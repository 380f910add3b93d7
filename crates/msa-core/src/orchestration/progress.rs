use crate::models::TaskId;

/// Advisory checkpoints; nothing waits on them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ProgressStage {
    Preparing,
    Running,
    ReadingResult,
    Completed,
}

impl ProgressStage {
    pub fn fraction(self) -> f32 {
        match self {
            Self::Preparing => 0.1,
            Self::Running => 0.2,
            Self::ReadingResult => 0.9,
            Self::Completed => 1.0,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Preparing => "preparing alignment",
            Self::Running => "running alignment tool",
            Self::ReadingResult => "alignment finished, reading result",
            Self::Completed => "completed",
        }
    }
}

pub trait ProgressSink: Send + Sync {
    fn report(&self, task_id: &TaskId, stage: ProgressStage);
}

pub struct NoopProgress;

impl ProgressSink for NoopProgress {
    fn report(&self, _task_id: &TaskId, _stage: ProgressStage) {}
}
