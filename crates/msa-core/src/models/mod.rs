pub mod error;
pub mod history;
pub mod task;
pub mod tool;

pub use error::{CoreError, CoreErrorKind};
pub use history::{HistoryRecord, NewHistoryRecord};
pub use task::{SessionId, TaskId, TaskStamp, TaskState};
pub use tool::ToolId;
