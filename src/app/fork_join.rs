// src/app/fork_join.rs

//! Stage-parallel module execution.
//!
//! Modules are grouped by [`Stage`]. Within a stage, worker-affine modules
//! are handed to the [`WorkerThread`] first, then main-affine modules run
//! on the calling thread, then the caller joins on the worker result.
//! Stages never overlap.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, warn};

use crate::fatal;
use crate::types::{Stage, TaskAffinity};
use crate::worker::{Task, TaskList, WorkerConfig, WorkerThread};

use super::ApplicationHandler;

/// A module shared between the handler and worker tasks.
pub type SharedModule = Arc<Mutex<dyn ApplicationHandler>>;

/// Modules per stage, with the thread each one runs on.
pub type ForkMap = BTreeMap<Stage, Vec<(TaskAffinity, SharedModule)>>;

pub struct ForkJoinModuleHandler {
    fork_map: ForkMap,
    worker: WorkerThread,
}

impl ForkJoinModuleHandler {
    /// Spawn a dedicated worker with the given placement.
    pub fn new(worker: WorkerConfig, fork_map: ForkMap) -> Self {
        Self::with_worker(WorkerThread::new(worker), fork_map)
    }

    pub fn with_worker(worker: WorkerThread, fork_map: ForkMap) -> Self {
        Self { fork_map, worker }
    }

    pub fn fork_map(&self) -> &ForkMap {
        &self.fork_map
    }

    /// Forward a non-parallel phase to every module, without short circuit.
    fn for_each_module(&mut self, phase: &str, call: fn(&mut dyn ApplicationHandler) -> bool) -> bool {
        let mut success = true;
        for (stage, modules) in &self.fork_map {
            for (index, (_, module)) in modules.iter().enumerate() {
                let ok = call_module(module, call);
                if !ok {
                    warn!(phase, %stage, module = index, "module phase failed");
                }
                success = ok && success;
            }
        }
        success
    }

    fn execute_stage(&self, stage: Stage, modules: &[(TaskAffinity, SharedModule)]) -> bool {
        let mut main_tasks: Vec<&SharedModule> = Vec::new();
        let mut worker_tasks = TaskList::new();

        for (affinity, module) in modules {
            match affinity {
                TaskAffinity::Main => main_tasks.push(module),
                TaskAffinity::Worker => {
                    let module = Arc::clone(module);
                    worker_tasks.push_back(Box::new(move || call_module(&module, |m| m.execute())) as Task);
                }
            }
        }

        debug!(%stage, main = main_tasks.len(), worker = worker_tasks.len(), "fork");

        // An empty submission would resolve to `false`; a stage without
        // worker modules has nothing to join on.
        let worker_future = if worker_tasks.is_empty() {
            None
        } else {
            Some(self.worker.submit(worker_tasks))
        };

        let mut main_success = true;
        for module in main_tasks {
            main_success = call_module(module, |m| m.execute()) && main_success;
        }

        let worker_success = match worker_future {
            None => true,
            Some(future) => match future.get() {
                Some(result) => result,
                None => {
                    error!(%stage, "worker result channel closed without a value");
                    fatal::abort_with("fork/join: worker future was never fulfilled")
                }
            },
        };

        debug!(%stage, main_success, worker_success, "join");
        main_success && worker_success
    }
}

/// A poisoned module lock means a previous call panicked mid-phase; the
/// module is treated as failed from then on.
fn call_module(module: &SharedModule, call: fn(&mut dyn ApplicationHandler) -> bool) -> bool {
    match module.lock() {
        Ok(mut guard) => call(&mut *guard),
        Err(_) => {
            error!("module lock poisoned");
            false
        }
    }
}

impl ApplicationHandler for ForkJoinModuleHandler {
    fn initialize(&mut self) -> bool {
        self.for_each_module("initialize", |m| m.initialize())
    }

    fn prepare_for_execute(&mut self) -> bool {
        self.for_each_module("prepare_for_execute", |m| m.prepare_for_execute())
    }

    /// Every stage runs, even after an earlier stage failed.
    fn execute(&mut self) -> bool {
        let mut success = true;
        for (stage, modules) in &self.fork_map {
            let ok = self.execute_stage(*stage, modules);
            if !ok {
                warn!(%stage, "stage failed");
            }
            success = ok && success;
        }
        success
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        self.for_each_module("prepare_for_shutdown", |m| m.prepare_for_shutdown())
    }

    fn shutdown(&mut self) -> bool {
        self.for_each_module("shutdown", |m| m.shutdown())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::{self, ThreadId};

    use super::*;

    /// Records the thread `execute` ran on and the global call order.
    struct Probe {
        result: bool,
        order: Arc<AtomicUsize>,
        seen_at: Option<usize>,
        thread: Option<ThreadId>,
        phases: u32,
    }

    impl Probe {
        fn shared(result: bool, order: &Arc<AtomicUsize>) -> Arc<Mutex<Probe>> {
            Arc::new(Mutex::new(Probe {
                result,
                order: Arc::clone(order),
                seen_at: None,
                thread: None,
                phases: 0,
            }))
        }
    }

    impl ApplicationHandler for Probe {
        fn initialize(&mut self) -> bool {
            self.phases += 1;
            self.result
        }
        fn prepare_for_execute(&mut self) -> bool {
            self.phases += 1;
            self.result
        }
        fn execute(&mut self) -> bool {
            self.seen_at = Some(self.order.fetch_add(1, Ordering::SeqCst));
            self.thread = Some(thread::current().id());
            self.result
        }
        fn prepare_for_shutdown(&mut self) -> bool {
            self.phases += 1;
            self.result
        }
        fn shutdown(&mut self) -> bool {
            self.phases += 1;
            self.result
        }
    }

    fn as_module(p: &Arc<Mutex<Probe>>) -> SharedModule {
        Arc::clone(p) as SharedModule
    }

    #[test]
    fn modules_run_on_their_affine_thread() {
        let order = Arc::new(AtomicUsize::new(0));
        let main = Probe::shared(true, &order);
        let work = Probe::shared(true, &order);

        let mut map = ForkMap::new();
        map.insert(
            Stage::Stage1,
            vec![
                (TaskAffinity::Main, as_module(&main)),
                (TaskAffinity::Worker, as_module(&work)),
            ],
        );
        let mut h = ForkJoinModuleHandler::new(WorkerConfig::default(), map);

        assert!(h.execute());
        let me = thread::current().id();
        assert_eq!(main.lock().unwrap().thread, Some(me));
        assert_ne!(work.lock().unwrap().thread, Some(me));
        assert!(work.lock().unwrap().thread.is_some());
    }

    #[test]
    fn stages_are_joined_in_order() {
        let order = Arc::new(AtomicUsize::new(0));
        let s1 = Probe::shared(true, &order);
        let s2 = Probe::shared(true, &order);
        let s3 = Probe::shared(true, &order);

        let mut map = ForkMap::new();
        map.insert(Stage::Stage3, vec![(TaskAffinity::Worker, as_module(&s3))]);
        map.insert(Stage::Stage1, vec![(TaskAffinity::Worker, as_module(&s1))]);
        map.insert(Stage::Stage2, vec![(TaskAffinity::Main, as_module(&s2))]);
        let mut h = ForkJoinModuleHandler::new(WorkerConfig::default(), map);

        assert!(h.execute());
        assert_eq!(s1.lock().unwrap().seen_at, Some(0));
        assert_eq!(s2.lock().unwrap().seen_at, Some(1));
        assert_eq!(s3.lock().unwrap().seen_at, Some(2));
    }

    #[test]
    fn failing_stage_does_not_skip_later_stages() {
        let order = Arc::new(AtomicUsize::new(0));
        let bad = Probe::shared(false, &order);
        let later = Probe::shared(true, &order);

        let mut map = ForkMap::new();
        map.insert(Stage::Stage1, vec![(TaskAffinity::Worker, as_module(&bad))]);
        map.insert(Stage::Stage2, vec![(TaskAffinity::Main, as_module(&later))]);
        let mut h = ForkJoinModuleHandler::new(WorkerConfig::default(), map);

        assert!(!h.execute());
        assert!(later.lock().unwrap().seen_at.is_some());
    }

    #[test]
    fn main_only_stage_succeeds_without_worker() {
        let order = Arc::new(AtomicUsize::new(0));
        let m = Probe::shared(true, &order);
        let mut map = ForkMap::new();
        map.insert(Stage::Stage1, vec![(TaskAffinity::Main, as_module(&m))]);
        let mut h = ForkJoinModuleHandler::new(WorkerConfig::default(), map);
        assert!(h.execute());
    }

    #[test]
    fn lifecycle_phases_reach_every_module_without_short_circuit() {
        let order = Arc::new(AtomicUsize::new(0));
        let a = Probe::shared(false, &order);
        let b = Probe::shared(true, &order);

        let mut map = ForkMap::new();
        map.insert(Stage::Stage1, vec![(TaskAffinity::Worker, as_module(&a))]);
        map.insert(Stage::Stage2, vec![(TaskAffinity::Main, as_module(&b))]);
        let mut h = ForkJoinModuleHandler::new(WorkerConfig::default(), map);

        assert!(!h.initialize());
        assert!(!h.prepare_for_execute());
        assert!(!h.prepare_for_shutdown());
        assert!(!h.shutdown());
        assert_eq!(a.lock().unwrap().phases, 4);
        assert_eq!(b.lock().unwrap().phases, 4);
    }
}
