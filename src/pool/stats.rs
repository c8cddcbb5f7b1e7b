//! Pool instrumentation snapshots.

use serde::Serialize;

/// Per-worker counters, updated by the worker that owns the slot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WorkerStats {
    pub worker_id: usize,
    pub tasks_processed: u64,
    pub tasks_failed: u64,
    pub total_processing_time_ms: f64,
}

impl WorkerStats {
    pub fn average_processing_time_ms(&self) -> f64 {
        if self.tasks_processed == 0 {
            0.0
        } else {
            self.total_processing_time_ms / self.tasks_processed as f64
        }
    }

    /// Fraction of this worker's tasks that completed successfully.
    pub fn efficiency(&self) -> f64 {
        if self.tasks_processed == 0 {
            0.0
        } else {
            (self.tasks_processed - self.tasks_failed) as f64 / self.tasks_processed as f64
        }
    }
}

/// Point-in-time view of the submission queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub queued: usize,
    pub processing: usize,
    pub queue_capacity: usize,
    pub shutting_down: bool,
}

/// Aggregate pool performance since construction.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceStats {
    pub uptime_seconds: f64,
    pub total_submitted: u64,
    pub total_completed: u64,
    pub total_failed: u64,
    pub active_tasks: usize,
    pub average_processing_time_ms: f64,
    pub throughput_per_second: f64,
    pub workers: Vec<WorkerStats>,
}

/// Outcome of `wait_for_completion`: each awaited task id lands in exactly
/// one bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CompletionReport {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub timed_out: Vec<String>,
}
