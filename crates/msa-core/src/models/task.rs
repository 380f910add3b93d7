use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, UtcOffset};
use time::macros::format_description;
use uuid::Uuid;

use crate::models::{CoreError, CoreErrorKind};

#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Accepts only well-formed tokens; anything else is treated as no session.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim())
            .ok()
            .map(|uuid| Self(uuid.hyphenated().to_string()))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short_suffix(&self) -> &str {
        let start = self
            .0
            .char_indices()
            .rev()
            .nth(5)
            .map(|(index, _)| index)
            .unwrap_or(0);
        &self.0[start..]
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Received,
    Staged,
    Running,
    Completed,
    Failed,
    Rejected,
}

impl TaskState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Rejected)
    }
}

/// Submission instant in UTC, rendered once for file names and once for the ledger.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TaskStamp {
    pub file_component: String,
    pub iso8601: String,
}

impl TaskStamp {
    pub fn now() -> Result<Self, CoreError> {
        Self::at(OffsetDateTime::now_utc())
    }

    pub fn at(instant: OffsetDateTime) -> Result<Self, CoreError> {
        let instant = instant.to_offset(UtcOffset::UTC);
        let file_component = instant
            .format(format_description!(
                "[year][month][day]_[hour][minute][second]"
            ))
            .map_err(format_error)?;
        let iso8601 = instant
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
            ))
            .map_err(format_error)?;
        Ok(Self {
            file_component,
            iso8601,
        })
    }
}

fn format_error(error: time::error::Format) -> CoreError {
    CoreError::new(
        CoreErrorKind::Internal,
        format!("failed to format task timestamp: {error}"),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use time::macros::datetime;

    use super::{SessionId, TaskId, TaskStamp, TaskState};

    #[test]
    fn task_ids_do_not_collide() {
        let ids: HashSet<TaskId> = (0..1_000).map(|_| TaskId::generate()).collect();
        assert_eq!(ids.len(), 1_000);
    }

    #[test]
    fn task_id_is_distinct_from_session_id_shape() {
        let task = TaskId::generate();
        let session = SessionId::generate();
        assert_eq!(task.as_str().len(), 32);
        assert!(!task.as_str().contains('-'));
        assert_eq!(session.as_str().len(), 36);
    }

    #[test]
    fn session_parse_rejects_malformed_tokens() {
        assert!(SessionId::parse("not-a-session").is_none());
        assert!(SessionId::parse("").is_none());

        let session = SessionId::generate();
        assert_eq!(SessionId::parse(session.as_str()), Some(session));
    }

    #[test]
    fn short_suffix_keeps_last_six_characters() {
        let session = SessionId::from_raw("abcdef-123456");
        assert_eq!(session.short_suffix(), "123456");
        assert_eq!(SessionId::from_raw("abc").short_suffix(), "abc");
    }

    #[test]
    fn stamp_renders_file_and_iso_forms() {
        let stamp = TaskStamp::at(datetime!(2024-03-09 07:05:03.25 UTC)).unwrap();
        assert_eq!(stamp.file_component, "20240309_070503");
        assert_eq!(stamp.iso8601, "2024-03-09T07:05:03.250000Z");
    }

    #[test]
    fn stamp_is_normalised_to_utc() {
        let stamp = TaskStamp::at(datetime!(2024-03-09 23:30:00 -02:00)).unwrap();
        assert_eq!(stamp.file_component, "20240310_013000");
        assert_eq!(stamp.iso8601, "2024-03-10T01:30:00.000000Z");
    }

    #[test]
    fn only_end_states_are_terminal() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Rejected.is_terminal());
        assert!(!TaskState::Received.is_terminal());
        assert!(!TaskState::Staged.is_terminal());
        assert!(!TaskState::Running.is_terminal());
    }
}
