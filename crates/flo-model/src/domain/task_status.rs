use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of one task inside a runner invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    /// Task is queued and has not been started.
    #[default]
    Pending,
    /// Task was started and has not reported yet.
    Running,
    /// Task reported a result.
    Succeeded,
    /// Task reported an error.
    Failed,
}

impl TaskStatus {
    /// Returns `true` if the task has settled (won't transition further).
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Succeeded | TaskStatus::Failed)
    }

    /// Returns `true` if the task is still active (pending or running).
    pub fn is_active(&self) -> bool {
        matches!(self, TaskStatus::Pending | TaskStatus::Running)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Succeeded => "succeeded",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
