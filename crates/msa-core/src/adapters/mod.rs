pub mod aligner;
pub(crate) mod detect_utils;
pub mod muscle;
pub mod process_adapter;
pub(crate) mod process_utils;

pub use aligner::AlignerCommand;
pub use muscle::{MuscleSyntax, parse_muscle_version};
pub use process_adapter::{ProcessToolAdapter, ToolAdapterConfig};

use crate::artifacts::ArtifactRef;
use crate::models::{CoreError, TaskId, ToolId};

pub type AdapterResult<T> = Result<T, CoreError>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolRequest {
    pub tool: ToolId,
    pub task_id: TaskId,
    pub input: ArtifactRef,
    pub output: ArtifactRef,
}

/// Uniform contract over the external aligners.
///
/// Implementations block until the tool exits; callers run them on a blocking worker
/// inside a tokio runtime. A single attempt is made per request.
pub trait ToolAdapter: Send + Sync {
    fn invoke(&self, request: ToolRequest) -> AdapterResult<ArtifactRef>;
}
