//! Bounded-concurrency task scheduler with drain.
//!
//! [`BoundedScheduler`] accepts fire-and-forget async tasks and runs at most
//! `limit` of them at once. Admission goes through a fair (FIFO) semaphore
//! fed by a single dispatcher, so tasks start in submission order. A pending
//! counter plus a [`Notify`] gives [`BoundedScheduler::drain`] its "all
//! settled" signal.
//!
//! Task failures (errors or panics) are logged and counted; they never
//! cancel siblings and never surface from `drain`. Only [`HaltHandle::halt`]
//! stops other tasks: queued ones never start and running ones are dropped
//! at their next suspension point.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, Notify, OwnedSemaphorePermit, Semaphore};
use tracing::{debug, error, warn};

use catalog_core::{Error, Result};

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Tasks accepted by `submit`.
    pub submitted: usize,
    /// Tasks that returned `Ok`.
    pub succeeded: usize,
    /// Tasks that returned `Err` or panicked.
    pub failed: usize,
    /// Tasks dropped because the scheduler was halted, started or not.
    pub cancelled: usize,
    /// Tasks executing right now.
    pub running: usize,
    /// Highest number of tasks ever executing at once.
    pub peak_running: usize,
}

struct QueuedTask {
    label: String,
    task: BoxFuture<'static, Result<()>>,
}

#[derive(Default)]
struct Shared {
    pending: AtomicUsize,
    idle: Notify,
    halted: Notify,
    submitted: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    running: AtomicUsize,
    peak_running: AtomicUsize,
}

impl Shared {
    /// Mark one task settled; wakes drainers when nothing is left.
    fn settle(&self) {
        if self.pending.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.idle.notify_waiters();
        }
    }

    fn cancel(&self, label: &str) {
        self.cancelled.fetch_add(1, Ordering::AcqRel);
        debug!(
            subsystem = "pipeline",
            component = "scheduler",
            task = label,
            "Task cancelled before start"
        );
        self.settle();
    }

    fn abort(&self, label: &str) {
        self.cancelled.fetch_add(1, Ordering::AcqRel);
        warn!(
            subsystem = "pipeline",
            component = "scheduler",
            task = label,
            "Running task aborted by halt"
        );
        self.settle();
    }
}

/// Halts a [`BoundedScheduler`] from inside a task.
#[derive(Clone)]
pub struct HaltHandle {
    gate: Arc<Semaphore>,
    shared: Arc<Shared>,
}

impl HaltHandle {
    /// Stop the scheduler.
    ///
    /// Queued tasks are cancelled and every other running task is dropped at
    /// its next `.await`. A task that calls `halt` and then returns without
    /// awaiting again still completes with its own result.
    pub fn halt(&self) {
        if !self.gate.is_closed() {
            warn!(
                subsystem = "pipeline",
                component = "scheduler",
                running = self.shared.running.load(Ordering::Acquire),
                "Scheduler halted, stopping running and queued tasks"
            );
            // Close first: `execute` checks the gate after registering for
            // the wake-up.
            self.gate.close();
            self.shared.halted.notify_waiters();
        }
    }
}

/// Runs submitted tasks with at most `limit` executing concurrently.
///
/// Must be created inside a tokio runtime: construction spawns the
/// dispatcher task.
pub struct BoundedScheduler {
    limit: usize,
    gate: Arc<Semaphore>,
    queue: mpsc::UnboundedSender<QueuedTask>,
    shared: Arc<Shared>,
}

impl BoundedScheduler {
    /// Create a scheduler admitting `limit` concurrent tasks.
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::Config(
                "concurrency limit must be at least 1".to_string(),
            ));
        }

        let gate = Arc::new(Semaphore::new(limit));
        let shared = Arc::new(Shared::default());
        let (queue, rx) = mpsc::unbounded_channel();

        tokio::spawn(dispatch(rx, gate.clone(), shared.clone()));

        Ok(Self {
            limit,
            gate,
            queue,
            shared,
        })
    }

    /// Enqueue `task` without waiting for a free slot.
    ///
    /// `label` identifies the task in failure logs.
    pub fn submit<F>(&self, label: impl Into<String>, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.shared.pending.fetch_add(1, Ordering::AcqRel);
        self.shared.submitted.fetch_add(1, Ordering::AcqRel);

        let queued = QueuedTask {
            label: label.into(),
            task: task.boxed(),
        };
        if let Err(mpsc::error::SendError(queued)) = self.queue.send(queued) {
            // Dispatcher is gone, which only happens while the runtime shuts down.
            self.shared.cancel(&queued.label);
        }
    }

    /// Wait until every submitted task has settled.
    ///
    /// Returns immediately when nothing is pending. Never reports task
    /// failures; read [`BoundedScheduler::stats`] for those.
    pub async fn drain(&self) {
        loop {
            let mut notified = std::pin::pin!(self.shared.idle.notified());
            // Register before reading the counter so a settle in between
            // cannot be missed.
            notified.as_mut().enable();

            let pending = self.shared.pending.load(Ordering::Acquire);
            if pending == 0 {
                return;
            }
            debug!(
                subsystem = "pipeline",
                component = "scheduler",
                op = "drain",
                pending,
                "Waiting for in-flight tasks"
            );
            notified.await;
        }
    }

    /// Stop admitting tasks. See [`HaltHandle::halt`].
    pub fn halt(&self) {
        self.halt_handle().halt();
    }

    /// Handle that can halt this scheduler from a running task.
    pub fn halt_handle(&self) -> HaltHandle {
        HaltHandle {
            gate: self.gate.clone(),
            shared: self.shared.clone(),
        }
    }

    /// Whether the scheduler has been halted.
    pub fn is_halted(&self) -> bool {
        self.gate.is_closed()
    }

    /// Tasks submitted but not yet settled.
    pub fn pending(&self) -> usize {
        self.shared.pending.load(Ordering::Acquire)
    }

    /// Configured concurrency limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Snapshot of the counters.
    pub fn stats(&self) -> SchedulerStats {
        let s = &self.shared;
        SchedulerStats {
            submitted: s.submitted.load(Ordering::Acquire),
            succeeded: s.succeeded.load(Ordering::Acquire),
            failed: s.failed.load(Ordering::Acquire),
            cancelled: s.cancelled.load(Ordering::Acquire),
            running: s.running.load(Ordering::Acquire),
            peak_running: s.peak_running.load(Ordering::Acquire),
        }
    }
}

/// Admit queued tasks in order, one permit each.
async fn dispatch(
    mut queue: mpsc::UnboundedReceiver<QueuedTask>,
    gate: Arc<Semaphore>,
    shared: Arc<Shared>,
) {
    while let Some(queued) = queue.recv().await {
        match gate.clone().acquire_owned().await {
            Ok(permit) => {
                tokio::spawn(execute(queued, permit, gate.clone(), shared.clone()));
            }
            Err(_closed) => shared.cancel(&queued.label),
        }
    }
}

async fn execute(
    queued: QueuedTask,
    permit: OwnedSemaphorePermit,
    gate: Arc<Semaphore>,
    shared: Arc<Shared>,
) {
    let mut halted = std::pin::pin!(shared.halted.notified());
    halted.as_mut().enable();
    if gate.is_closed() {
        drop(permit);
        shared.cancel(&queued.label);
        return;
    }

    let running = shared.running.fetch_add(1, Ordering::AcqRel) + 1;
    shared.peak_running.fetch_max(running, Ordering::AcqRel);

    // The task is polled first, so a task that halts and returns in the
    // same poll keeps its result.
    let outcome = tokio::select! {
        biased;
        outcome = AssertUnwindSafe(queued.task).catch_unwind() => Some(outcome),
        _ = halted => None,
    };

    shared.running.fetch_sub(1, Ordering::AcqRel);
    drop(permit);

    match outcome {
        None => {
            shared.abort(&queued.label);
            return;
        }
        Some(Ok(Ok(()))) => {
            shared.succeeded.fetch_add(1, Ordering::AcqRel);
        }
        Some(Ok(Err(e))) => {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            warn!(
                subsystem = "pipeline",
                component = "scheduler",
                task = %queued.label,
                error = %e,
                "Task failed"
            );
        }
        Some(Err(_panic)) => {
            shared.failed.fetch_add(1, Ordering::AcqRel);
            error!(
                subsystem = "pipeline",
                component = "scheduler",
                task = %queued.label,
                "Task panicked"
            );
        }
    }

    shared.settle();
}
