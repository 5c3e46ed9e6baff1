//! Work-item references (projects and tasks) as seen by the user lifecycle.
//!
//! Only enough of a project or task is modelled here to answer "is there
//! open work assigned to this person?".

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{STATUS_COMPLETED, STATUS_IN_PROGRESS, STATUS_OPEN};
use crate::error::DomainError;

/// Completion status shared by projects and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkStatus {
    #[serde(rename = "Open")]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    #[serde(rename = "Completed")]
    Completed,
}

impl WorkStatus {
    /// Stored description of this status
    pub fn description(&self) -> &'static str {
        match self {
            WorkStatus::Open => STATUS_OPEN,
            WorkStatus::InProgress => STATUS_IN_PROGRESS,
            WorkStatus::Completed => STATUS_COMPLETED,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, WorkStatus::Completed)
    }
}

impl FromStr for WorkStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [WorkStatus::Open, WorkStatus::InProgress, WorkStatus::Completed]
            .into_iter()
            .find(|status| status.description().eq_ignore_ascii_case(s))
            .ok_or_else(|| DomainError::UnknownStatus(s.to_string()))
    }
}

impl std::fmt::Display for WorkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Project assigned to a manager
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub status: WorkStatus,
}

/// Task assigned to an employee
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    pub id: i64,
    pub subject: String,
    pub status: WorkStatus,
}
