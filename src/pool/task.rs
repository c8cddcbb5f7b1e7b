//! Task records tracked by the pool.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::ticket::Ticket;

/// Lifecycle of a pooled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// One submitted question and everything the pool knows about it.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerTask {
    pub task_id: String,
    pub question: String,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub worker_id: Option<usize>,
    pub result: Option<Ticket>,
    pub error: Option<String>,
}

impl WorkerTask {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            task_id: Uuid::new_v4().to_string(),
            question: question.into(),
            state: TaskState::Queued,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            worker_id: None,
            result: None,
            error: None,
        }
    }

    /// Wall-clock time from submission to completion, if finished.
    pub fn turnaround_ms(&self) -> Option<f64> {
        let done = self.completed_at?;
        Some((done - self.created_at).num_milliseconds() as f64)
    }
}
