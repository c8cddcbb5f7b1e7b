//! Worker pool for concurrent ticket processing.

mod stats;
mod task;
mod workers;

pub use stats::{CompletionReport, PerformanceStats, QueueStatus, WorkerStats};
pub use task::{TaskState, WorkerTask};
pub use workers::{PoolError, WorkerPool};
