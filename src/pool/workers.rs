//! Concurrent ticket processing over a fixed set of workers.
//!
//! The pool front-ends one shared [`TicketWorkflow`]: callers submit raw
//! questions, workers pull them off a bounded queue and run the workflow,
//! and finished tasks land in bounded completed/failed histories. Submission
//! is non-blocking; a full queue or a shutdown in progress is an error the
//! caller handles, never a silent drop.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PoolConfig;
use crate::ports::{Classifier, Generator};
use crate::ticket::{ConversationContext, TicketStatus};
use crate::workflow::TicketWorkflow;

use super::stats::{CompletionReport, PerformanceStats, QueueStatus, WorkerStats};
use super::task::{TaskState, WorkerTask};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PoolError {
    #[error("submission queue is full")]
    QueueFull,
    #[error("pool is shutting down")]
    ShuttingDown,
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    active: Mutex<HashMap<String, WorkerTask>>,
    completed: Mutex<Vec<WorkerTask>>,
    failed: Mutex<Vec<WorkerTask>>,
    worker_stats: Mutex<Vec<WorkerStats>>,
    total_submitted: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
    shutting_down: AtomicBool,
    completed_cap: usize,
    failed_cap: usize,
}

impl PoolShared {
    /// Append to a bounded history, trimming the oldest half at the cap.
    fn push_history(history: &Mutex<Vec<WorkerTask>>, cap: usize, task: WorkerTask) {
        let mut guard = history.lock().expect("pool history lock poisoned");
        guard.push(task);
        if guard.len() > cap {
            let keep = cap / 2;
            let excess = guard.len() - keep;
            guard.drain(..excess);
        }
    }
}

/// Pool of workers running tickets through one shared workflow.
pub struct WorkerPool<C, G> {
    workflow: Arc<TicketWorkflow<C, G>>,
    shared: Arc<PoolShared>,
    sender: Mutex<Option<mpsc::Sender<String>>>,
    config: PoolConfig,
    started: Instant,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C, G> WorkerPool<C, G>
where
    C: Classifier + 'static,
    G: Generator + 'static,
{
    /// Spawn `config.worker_count` workers. Must be called inside a tokio
    /// runtime.
    pub fn new(workflow: Arc<TicketWorkflow<C, G>>, config: PoolConfig) -> Self {
        let (tx, rx) = mpsc::channel::<String>(config.queue_size);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let shared = Arc::new(PoolShared {
            active: Mutex::new(HashMap::new()),
            completed: Mutex::new(Vec::new()),
            failed: Mutex::new(Vec::new()),
            worker_stats: Mutex::new(
                (0..config.worker_count)
                    .map(|worker_id| WorkerStats {
                        worker_id,
                        ..WorkerStats::default()
                    })
                    .collect(),
            ),
            total_submitted: AtomicU64::new(0),
            total_completed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
            shutting_down: AtomicBool::new(false),
            completed_cap: config.completed_history_cap,
            failed_cap: config.failed_history_cap,
        });

        let mut handles = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let workflow = Arc::clone(&workflow);
            let shared = Arc::clone(&shared);
            let rx = Arc::clone(&rx);
            handles.push(tokio::spawn(run_worker(worker_id, workflow, shared, rx)));
        }
        info!(workers = config.worker_count, queue = config.queue_size, "worker pool started");

        Self {
            workflow,
            shared,
            sender: Mutex::new(Some(tx)),
            config,
            started: Instant::now(),
            handles: Mutex::new(handles),
        }
    }

    /// Queue one question. Returns the task id used to poll for the result.
    pub fn submit(&self, question: &str) -> Result<String, PoolError> {
        if self.shared.shutting_down.load(Ordering::SeqCst) {
            return Err(PoolError::ShuttingDown);
        }
        let sender = {
            let guard = self.sender.lock().expect("pool sender lock poisoned");
            guard.as_ref().cloned().ok_or(PoolError::ShuttingDown)?
        };

        let task = WorkerTask::new(question);
        let task_id = task.task_id.clone();

        // Registered before the send so a worker can never receive an id it
        // cannot find; rolled back if the queue rejects it.
        self.shared
            .active
            .lock()
            .expect("pool active lock poisoned")
            .insert(task_id.clone(), task);

        match sender.try_send(task_id.clone()) {
            Ok(()) => {
                self.shared.total_submitted.fetch_add(1, Ordering::SeqCst);
                debug!(task_id = %task_id, "task queued");
                Ok(task_id)
            }
            Err(e) => {
                self.shared
                    .active
                    .lock()
                    .expect("pool active lock poisoned")
                    .remove(&task_id);
                match e {
                    mpsc::error::TrySendError::Full(_) => Err(PoolError::QueueFull),
                    mpsc::error::TrySendError::Closed(_) => Err(PoolError::ShuttingDown),
                }
            }
        }
    }

    /// Queue a batch, one result per question in the same order.
    pub fn submit_batch(&self, questions: &[String]) -> Vec<Result<String, PoolError>> {
        questions.iter().map(|q| self.submit(q)).collect()
    }

    /// Current view of one task: active, completed, or failed.
    pub fn task_status(&self, task_id: &str) -> Option<WorkerTask> {
        if let Some(task) = self
            .shared
            .active
            .lock()
            .expect("pool active lock poisoned")
            .get(task_id)
        {
            return Some(task.clone());
        }
        let find = |history: &Mutex<Vec<WorkerTask>>| {
            history
                .lock()
                .expect("pool history lock poisoned")
                .iter()
                .find(|t| t.task_id == task_id)
                .cloned()
        };
        find(&self.shared.completed).or_else(|| find(&self.shared.failed))
    }

    /// Poll the given tasks until all resolve or the timeout passes. Tasks
    /// still unresolved at the deadline are reported as timed out; their
    /// workers are not interrupted.
    pub async fn wait_for_completion(
        &self,
        task_ids: &[String],
        timeout: Option<Duration>,
    ) -> CompletionReport {
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut pending: Vec<String> = task_ids.to_vec();
        let mut report = CompletionReport::default();

        loop {
            pending.retain(|id| match self.task_status(id) {
                Some(task) if task.state == TaskState::Completed => {
                    report.completed.push(id.clone());
                    false
                }
                Some(task) if task.state == TaskState::Failed => {
                    report.failed.push(id.clone());
                    false
                }
                _ => true,
            });
            if pending.is_empty() {
                break;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    report.timed_out = pending;
                    break;
                }
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
        report
    }

    /// Poll until no task is active, bounded by `timeout`. Returns whether
    /// the pool drained in time.
    async fn drain(&self, timeout: Option<Duration>) -> bool {
        let deadline = timeout.map(|t| Instant::now() + t);
        loop {
            let pending = self
                .shared
                .active
                .lock()
                .expect("pool active lock poisoned")
                .len();
            if pending == 0 {
                return true;
            }
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    return false;
                }
            }
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }

    /// Stop accepting submissions and wind the pool down.
    ///
    /// With `wait` the queue drains first (bounded by `timeout`); without it
    /// every task still registered is marked failed immediately.
    pub async fn shutdown(&self, wait: bool, timeout: Option<Duration>) {
        self.shared.shutting_down.store(true, Ordering::SeqCst);
        // Dropping the sender closes the queue; workers exit once drained.
        drop(
            self.sender
                .lock()
                .expect("pool sender lock poisoned")
                .take(),
        );
        info!(wait, "pool shutdown requested");

        let drained = wait && self.drain(timeout).await;
        if wait && !drained {
            warn!("shutdown timed out with tasks still in flight");
        }

        let abandoned: Vec<WorkerTask> = {
            let mut active = self.shared.active.lock().expect("pool active lock poisoned");
            active.drain().map(|(_, t)| t).collect()
        };
        for mut task in abandoned {
            task.state = TaskState::Failed;
            task.error = Some("shutdown requested before task ran".to_string());
            task.completed_at = Some(Utc::now());
            self.shared.total_failed.fetch_add(1, Ordering::SeqCst);
            warn!(task_id = %task.task_id, "task abandoned at shutdown");
            PoolShared::push_history(&self.shared.failed, self.shared.failed_cap, task);
        }

        let handles: Vec<JoinHandle<()>> = {
            let mut guard = self.handles.lock().expect("pool handles lock poisoned");
            guard.drain(..).collect()
        };
        // Only a fully drained pool has workers that are guaranteed to exit;
        // after a timed-out drain a worker may be stuck inside a port call,
        // so waiting on it would break the caller's timeout bound.
        for handle in handles {
            if drained {
                let _ = handle.await;
            } else {
                handle.abort();
            }
        }
        info!("pool shut down");
    }

    pub fn queue_status(&self) -> QueueStatus {
        let active = self.shared.active.lock().expect("pool active lock poisoned");
        let queued = active
            .values()
            .filter(|t| t.state == TaskState::Queued)
            .count();
        QueueStatus {
            queued,
            processing: active.len() - queued,
            queue_capacity: self.config.queue_size,
            shutting_down: self.shared.shutting_down.load(Ordering::SeqCst),
        }
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        let workers = self
            .shared
            .worker_stats
            .lock()
            .expect("pool worker stats lock poisoned")
            .clone();
        let total_completed = self.shared.total_completed.load(Ordering::SeqCst);
        let total_time_ms: f64 = workers.iter().map(|w| w.total_processing_time_ms).sum();
        let total_processed: u64 = workers.iter().map(|w| w.tasks_processed).sum();
        let uptime = self.started.elapsed().as_secs_f64();
        PerformanceStats {
            uptime_seconds: uptime,
            total_submitted: self.shared.total_submitted.load(Ordering::SeqCst),
            total_completed,
            total_failed: self.shared.total_failed.load(Ordering::SeqCst),
            active_tasks: self
                .shared
                .active
                .lock()
                .expect("pool active lock poisoned")
                .len(),
            average_processing_time_ms: if total_processed == 0 {
                0.0
            } else {
                total_time_ms / total_processed as f64
            },
            throughput_per_second: if uptime > 0.0 {
                total_completed as f64 / uptime
            } else {
                0.0
            },
            workers,
        }
    }

    /// The workflow instance shared by all workers.
    pub fn workflow(&self) -> &Arc<TicketWorkflow<C, G>> {
        &self.workflow
    }
}

/// One worker: claim a task id off the queue, run the workflow, record the
/// outcome. Exits when the queue is closed and drained.
async fn run_worker<C, G>(
    worker_id: usize,
    workflow: Arc<TicketWorkflow<C, G>>,
    shared: Arc<PoolShared>,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<String>>>,
) where
    C: Classifier,
    G: Generator,
{
    debug!(worker_id, "worker started");
    loop {
        let task_id = {
            let mut rx = rx.lock().await;
            match rx.recv().await {
                Some(id) => id,
                None => break,
            }
        };

        // A forced shutdown may have already removed the record.
        let question = {
            let mut active = shared.active.lock().expect("pool active lock poisoned");
            match active.get_mut(&task_id) {
                Some(task) => {
                    task.state = TaskState::Processing;
                    task.started_at = Some(Utc::now());
                    task.worker_id = Some(worker_id);
                    task.question.clone()
                }
                None => {
                    warn!(worker_id, task_id = %task_id, "queued task no longer registered");
                    continue;
                }
            }
        };

        let run_started = Instant::now();
        let mut context = ConversationContext::new();
        let ticket = workflow.process(&question, &mut context).await;
        let elapsed_ms = run_started.elapsed().as_secs_f64() * 1000.0;
        let failed = ticket.status == TicketStatus::Failed;

        let task = {
            let mut active = shared.active.lock().expect("pool active lock poisoned");
            active.remove(&task_id)
        };
        let Some(mut task) = task else {
            warn!(worker_id, task_id = %task_id, "task removed while processing; result dropped");
            continue;
        };

        task.completed_at = Some(Utc::now());
        if failed {
            task.state = TaskState::Failed;
            task.error = ticket.errors.last().cloned();
            task.result = Some(ticket);
            shared.total_failed.fetch_add(1, Ordering::SeqCst);
            PoolShared::push_history(&shared.failed, shared.failed_cap, task);
        } else {
            task.state = TaskState::Completed;
            task.result = Some(ticket);
            shared.total_completed.fetch_add(1, Ordering::SeqCst);
            PoolShared::push_history(&shared.completed, shared.completed_cap, task);
        }

        {
            let mut stats = shared
                .worker_stats
                .lock()
                .expect("pool worker stats lock poisoned");
            let slot = &mut stats[worker_id];
            slot.tasks_processed += 1;
            if failed {
                slot.tasks_failed += 1;
            }
            slot.total_processing_time_ms += elapsed_ms;
        }
        debug!(worker_id, task_id = %task_id, elapsed_ms, failed, "task finished");
    }
    debug!(worker_id, "worker exiting");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkflowConfig;
    use crate::service::{KeywordClassifier, TemplateGenerator};

    fn small_pool() -> WorkerPool<KeywordClassifier, TemplateGenerator> {
        let workflow = Arc::new(TicketWorkflow::new(
            KeywordClassifier::new(),
            TemplateGenerator::new(),
            WorkflowConfig::default(),
        ));
        WorkerPool::new(
            workflow,
            PoolConfig {
                worker_count: 2,
                queue_size: 8,
                poll_interval_ms: 10,
                ..PoolConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn test_submit_and_complete() {
        let pool = small_pool();
        let id = pool.submit("How do I update my payment method?").unwrap();
        let report = pool
            .wait_for_completion(&[id.clone()], Some(Duration::from_secs(5)))
            .await;
        assert!(report.timed_out.is_empty());
        assert_eq!(report.completed, vec![id.clone()]);
        let task = pool.task_status(&id).unwrap();
        assert_eq!(task.state, TaskState::Completed);
        assert!(task.result.is_some());
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_rejected() {
        let pool = small_pool();
        pool.shutdown(true, Some(Duration::from_secs(5))).await;
        assert_eq!(pool.submit("anything"), Err(PoolError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_batch_submission_preserves_order() {
        let pool = small_pool();
        let questions: Vec<String> = (0..3)
            .map(|i| format!("question number {i} about my invoice"))
            .collect();
        let ids: Vec<String> = pool
            .submit_batch(&questions)
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(ids.len(), 3);
        let report = pool
            .wait_for_completion(&ids, Some(Duration::from_secs(5)))
            .await;
        assert_eq!(report.completed.len() + report.failed.len(), 3);
        assert!(report.timed_out.is_empty());
        pool.shutdown(true, Some(Duration::from_secs(1))).await;
    }

    #[test]
    fn test_history_trims_at_cap() {
        let history = Mutex::new(Vec::new());
        for i in 0..11 {
            let mut task = WorkerTask::new(format!("q{i}"));
            task.state = TaskState::Completed;
            PoolShared::push_history(&history, 10, task);
        }
        let guard = history.lock().unwrap();
        assert_eq!(guard.len(), 5);
        assert_eq!(guard[0].question, "q6");
    }
}
