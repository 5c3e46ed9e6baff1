//! Results of operations that write both locally and to the identity directory.

use serde::Serialize;

use common::AppError;

/// State of the identity directory after a lifecycle operation.
///
/// The local write has already been committed either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DirectorySync {
    Synced,
    Failed { reason: String },
}

impl DirectorySync {
    pub fn is_synced(&self) -> bool {
        matches!(self, DirectorySync::Synced)
    }
}

impl From<Result<(), AppError>> for DirectorySync {
    fn from(result: Result<(), AppError>) -> Self {
        match result {
            Ok(()) => DirectorySync::Synced,
            Err(err) => DirectorySync::Failed {
                reason: err.to_string(),
            },
        }
    }
}

/// Persisted record plus the directory sync status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleOutcome<T> {
    pub record: T,
    pub directory: DirectorySync,
}

impl<T> LifecycleOutcome<T> {
    pub fn new(record: T, directory: DirectorySync) -> Self {
        Self { record, directory }
    }

    pub fn into_record(self) -> T {
        self.record
    }
}
