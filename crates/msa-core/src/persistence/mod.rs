use crate::models::{CoreError, HistoryRecord, NewHistoryRecord, SessionId};

pub type PersistenceResult<T> = Result<T, CoreError>;

pub trait MigrationStore: Send + Sync {
    fn current_version(&self) -> PersistenceResult<i64>;

    fn apply_migration(&self, target_version: i64) -> PersistenceResult<()>;
}

/// Append-only ledger of completed tasks.
pub trait HistoryStore: Send + Sync {
    /// Inserts one record atomically; a duplicate task id is rejected.
    fn append(&self, record: &NewHistoryRecord) -> PersistenceResult<HistoryRecord>;

    /// Up to `limit` records for `session`, newest first.
    fn query(&self, session: &SessionId, limit: usize) -> PersistenceResult<Vec<HistoryRecord>>;
}
