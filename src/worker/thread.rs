// src/worker/thread.rs

//! A single long-lived worker thread that runs one task batch at a time.
//!
//! The submitter hands over a whole batch and gets a [`WorkerFuture`] back.
//! The worker drains the batch, ANDs the task results and fulfils the
//! promise. A new batch is only accepted once the previous one has been
//! delivered, so batches never interleave.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::fatal;

use super::future::{Promise, WorkerFuture};
use super::placement;

/// A unit of work. Returns `true` on success.
pub type Task = Box<dyn FnOnce() -> bool + Send + 'static>;

/// Ordered batch handed to the worker in one submission.
pub type TaskList = VecDeque<Task>;

/// Placement of the worker thread.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub name: String,
    /// CPU core to pin to. `None` leaves the inherited mask.
    pub core_id: Option<usize>,
    /// Scheduling priority within the inherited policy.
    pub priority: Option<i32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: "cyclexec-worker".to_string(),
            core_id: None,
            priority: None,
        }
    }
}

#[derive(Default)]
struct WorkerState {
    tasks: TaskList,
    promise: Option<Promise>,
    stop: bool,
    ready: bool,
}

impl WorkerState {
    /// No batch queued and no result outstanding.
    fn is_idle(&self) -> bool {
        self.tasks.is_empty() && self.promise.is_none()
    }

    fn fulfill(&mut self, value: bool) {
        if let Some(promise) = self.promise.take() {
            // The submitter may have dropped its future; nothing to deliver then.
            let _ = promise.send(value);
        }
    }
}

#[derive(Default)]
struct Shared {
    state: Mutex<WorkerState>,
    work_available: Condvar,
    worker_idle: Condvar,
}

impl Shared {
    /// Tasks run outside the lock, so a poisoned mutex only means a
    /// submitter panicked mid-call. The state itself stays consistent.
    fn lock(&self) -> MutexGuard<'_, WorkerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owner of the worker thread. Dropping it stops and joins the thread.
pub struct WorkerThread {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
    name: String,
}

impl WorkerThread {
    /// Spawn the worker and wait until it has applied its placement.
    ///
    /// Failing to spawn, pin or prioritise the thread aborts the process.
    pub fn new(config: WorkerConfig) -> Self {
        let shared = Arc::new(Shared::default());
        let name = config.name.clone();

        let thread_shared = Arc::clone(&shared);
        let spawned = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_main(thread_shared, config));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(err) => fatal::abort_with(&format!("failed to spawn worker thread {name}: {err}")),
        };

        {
            let guard = shared.lock();
            let _ready = shared
                .worker_idle
                .wait_while(guard, |s| !s.ready)
                .unwrap_or_else(PoisonError::into_inner);
        }

        Self {
            shared,
            handle: Some(handle),
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether no batch is queued or running.
    pub fn is_idle(&self) -> bool {
        self.shared.lock().is_idle()
    }

    /// Hand a batch to the worker, blocking until the previous batch has
    /// been delivered.
    ///
    /// An empty batch resolves to `false` immediately without touching the
    /// worker.
    pub fn submit(&self, tasks: TaskList) -> WorkerFuture {
        if tasks.is_empty() {
            debug!(worker = %self.name, "empty batch rejected");
            return WorkerFuture::resolved(false);
        }

        let guard = self.shared.lock();
        let mut state = self
            .shared
            .worker_idle
            .wait_while(guard, |s| !s.is_idle() && !s.stop)
            .unwrap_or_else(PoisonError::into_inner);

        if state.stop {
            return WorkerFuture::resolved(false);
        }
        self.install(&mut state, tasks)
    }

    /// Convenience for a batch of one.
    pub fn submit_one<F>(&self, task: F) -> WorkerFuture
    where
        F: FnOnce() -> bool + Send + 'static,
    {
        let mut tasks = TaskList::new();
        tasks.push_back(Box::new(task));
        self.submit(tasks)
    }

    /// Like [`submit`](Self::submit) but never blocks.
    ///
    /// Resolves to `false` when the state lock is contended or a batch is
    /// still in flight. The worker state is left untouched in that case.
    pub fn try_submit(&self, tasks: TaskList) -> WorkerFuture {
        if tasks.is_empty() {
            return WorkerFuture::resolved(false);
        }

        let mut state = match self.shared.state.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => {
                debug!(worker = %self.name, "try_submit: state lock contended");
                return WorkerFuture::resolved(false);
            }
        };

        if state.stop || !state.is_idle() {
            debug!(worker = %self.name, "try_submit: worker busy");
            return WorkerFuture::resolved(false);
        }
        self.install(&mut state, tasks)
    }

    fn install(&self, state: &mut WorkerState, tasks: TaskList) -> WorkerFuture {
        let (promise, future) = WorkerFuture::pending();
        debug!(worker = %self.name, tasks = tasks.len(), "batch submitted");
        state.tasks = tasks;
        state.promise = Some(promise);
        self.shared.work_available.notify_one();
        future
    }
}

impl Drop for WorkerThread {
    fn drop(&mut self) {
        {
            let mut state = self.shared.lock();
            state.stop = true;
            state.fulfill(false);
        }
        self.shared.work_available.notify_all();
        self.shared.worker_idle.notify_all();

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!(worker = %self.name, "worker thread terminated by panic");
            }
        }
        debug!(worker = %self.name, "worker thread joined");
    }
}

impl std::fmt::Debug for WorkerThread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.name)
            .field("idle", &self.is_idle())
            .finish()
    }
}

fn worker_main(shared: Arc<Shared>, config: WorkerConfig) {
    apply_placement(&config);

    shared.lock().ready = true;
    shared.worker_idle.notify_all();
    info!(
        worker = %config.name,
        core_id = ?config.core_id,
        priority = ?config.priority,
        "worker thread started"
    );

    loop {
        let batch = {
            let guard = shared.lock();
            let mut state = shared
                .work_available
                .wait_while(guard, |s| s.tasks.is_empty() && !s.stop)
                .unwrap_or_else(PoisonError::into_inner);

            if state.stop {
                state.fulfill(false);
                break;
            }
            std::mem::take(&mut state.tasks)
        };

        let success = run_batch(batch);

        shared.lock().fulfill(success);
        shared.worker_idle.notify_all();
    }

    debug!(worker = %config.name, "worker thread stopping");
}

fn apply_placement(config: &WorkerConfig) {
    if let Some(core_id) = config.core_id {
        if let Err(err) = placement::pin_current_thread(core_id) {
            fatal::abort_with(&format!("worker {}: {err}", config.name));
        }
    }
    if let Some(priority) = config.priority {
        if let Err(err) = placement::set_current_thread_priority(priority) {
            fatal::abort_with(&format!("worker {}: {err}", config.name));
        }
    }
}

/// Run every task, even after a failure. A panic counts as a failure.
fn run_batch(batch: TaskList) -> bool {
    let mut success = true;
    for (index, task) in batch.into_iter().enumerate() {
        let ok = match panic::catch_unwind(AssertUnwindSafe(task)) {
            Ok(ok) => ok,
            Err(_) => {
                warn!(task = index, "worker task panicked");
                false
            }
        };
        success = ok && success;
    }
    success
}
