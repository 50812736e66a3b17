//! Scripted collaborators for executor and handler tests.
//!
//! Every fake writes what happened to a shared [`Journal`], so a test can
//! assert the interleaving of application, checkpoint and environment calls
//! after the fakes have been moved into an executor.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cyclexec::app::{Application, ApplicationHandler};
use cyclexec::checkpoint::{Checkpoint, CheckpointError, CheckpointResult};
use cyclexec::env::ExecutionEnvironment;
use cyclexec::os::PosixHelper;
use cyclexec::trigger::{Clock, NullTriggerCondition, PeriodicActivation, SimpleTrigger, Trigger};
use cyclexec::types::{EnvState, MethodState, When};

/// Ordered log of calls shared between fakes.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries starting with `prefix`, in order.
    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.starts_with(prefix))
            .collect()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| *e == entry).count()
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Clock that only moves when told to or when slept on.
///
/// `sleep_until` jumps straight to the deadline, plus any overshoot queued
/// with [`ManualClock::overshoot_next`].
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Duration>>,
    overshoot: Arc<Mutex<VecDeque<Duration>>>,
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl ManualClock {
    pub fn at(now: Duration) -> Self {
        let clock = Self::default();
        *clock.now.lock().unwrap() = now;
        clock
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    /// Make the next sleep wake up late by `by`.
    pub fn overshoot_next(&self, by: Duration) {
        self.overshoot.lock().unwrap().push_back(by);
    }

    /// Deadlines passed to `sleep_until`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    fn sleep_until(&self, deadline: Duration) {
        self.sleeps.lock().unwrap().push(deadline);
        let extra = self.overshoot.lock().unwrap().pop_front().unwrap_or_default();
        let mut now = self.now.lock().unwrap();
        if *now < deadline {
            *now = deadline;
        }
        *now += extra;
    }
}

pub type ManualPeriodicTrigger = SimpleTrigger<PeriodicActivation<ManualClock>, NullTriggerCondition>;

pub fn manual_periodic_trigger(
    clock: ManualClock,
    period: Duration,
    offset: Duration,
) -> ManualPeriodicTrigger {
    let activation = PeriodicActivation::with_clock(clock, period, offset).unwrap();
    SimpleTrigger::new(activation, NullTriggerCondition)
}

/// Trigger that never sleeps. Its gate result can be scripted.
pub struct InstantTrigger {
    journal: Journal,
    gates: VecDeque<bool>,
}

impl InstantTrigger {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            gates: VecDeque::new(),
        }
    }

    /// Gate results for the next calls; afterwards the gate is open.
    pub fn with_gates(mut self, gates: impl IntoIterator<Item = bool>) -> Self {
        self.gates.extend(gates);
        self
    }
}

impl Trigger for InstantTrigger {
    fn check_trigger_condition_and_wait(&mut self) -> bool {
        self.journal.push("trigger");
        self.gates.pop_front().unwrap_or(true)
    }
}

// ---------------------------------------------------------------------------
// Applications
// ---------------------------------------------------------------------------

/// Application with a scripted result queue per lifecycle call. Calls past
/// the end of a queue return `Successful`.
pub struct ScriptedApp {
    journal: Journal,
    initialize: VecDeque<MethodState>,
    start: VecDeque<MethodState>,
    step: VecDeque<MethodState>,
    stop: VecDeque<MethodState>,
    terminate: VecDeque<MethodState>,
}

impl ScriptedApp {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            initialize: VecDeque::new(),
            start: VecDeque::new(),
            step: VecDeque::new(),
            stop: VecDeque::new(),
            terminate: VecDeque::new(),
        }
    }

    pub fn on_initialize_returns(mut self, states: impl IntoIterator<Item = MethodState>) -> Self {
        self.initialize.extend(states);
        self
    }

    pub fn on_start_returns(mut self, states: impl IntoIterator<Item = MethodState>) -> Self {
        self.start.extend(states);
        self
    }

    pub fn step_returns(mut self, states: impl IntoIterator<Item = MethodState>) -> Self {
        self.step.extend(states);
        self
    }

    pub fn on_stop_returns(mut self, states: impl IntoIterator<Item = MethodState>) -> Self {
        self.stop.extend(states);
        self
    }

    pub fn on_terminate_returns(mut self, states: impl IntoIterator<Item = MethodState>) -> Self {
        self.terminate.extend(states);
        self
    }

    fn record(journal: &Journal, call: &str, queue: &mut VecDeque<MethodState>) -> MethodState {
        journal.push(format!("app:{call}"));
        queue.pop_front().unwrap_or(MethodState::Successful)
    }
}

impl Application for ScriptedApp {
    fn on_initialize(&mut self) -> MethodState {
        Self::record(&self.journal, "on_initialize", &mut self.initialize)
    }

    fn on_start(&mut self) -> MethodState {
        Self::record(&self.journal, "on_start", &mut self.start)
    }

    fn step(&mut self) -> MethodState {
        Self::record(&self.journal, "step", &mut self.step)
    }

    fn on_stop(&mut self) -> MethodState {
        Self::record(&self.journal, "on_stop", &mut self.stop)
    }

    fn on_terminate(&mut self) -> MethodState {
        Self::record(&self.journal, "on_terminate", &mut self.terminate)
    }
}

/// Handler with fixed per-phase results, for driving the executor
/// directly. `execute` results can be scripted per cycle.
pub struct ScriptedHandler {
    journal: Journal,
    pub initialize: bool,
    pub prepare_for_execute: bool,
    pub prepare_for_shutdown: bool,
    pub shutdown: bool,
    execute: VecDeque<bool>,
}

impl ScriptedHandler {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            initialize: true,
            prepare_for_execute: true,
            prepare_for_shutdown: true,
            shutdown: true,
            execute: VecDeque::new(),
        }
    }

    pub fn execute_returns(mut self, results: impl IntoIterator<Item = bool>) -> Self {
        self.execute.extend(results);
        self
    }

    fn record(&self, phase: &str, result: bool) -> bool {
        self.journal.push(format!("handler:{phase}"));
        result
    }
}

impl ApplicationHandler for ScriptedHandler {
    fn initialize(&mut self) -> bool {
        self.record("initialize", self.initialize)
    }

    fn prepare_for_execute(&mut self) -> bool {
        self.record("prepare_for_execute", self.prepare_for_execute)
    }

    fn execute(&mut self) -> bool {
        let result = self.execute.pop_front().unwrap_or(true);
        self.record("execute", result)
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        self.record("prepare_for_shutdown", self.prepare_for_shutdown)
    }

    fn shutdown(&mut self) -> bool {
        self.record("shutdown", self.shutdown)
    }
}

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Checkpoint that journals `checkpoint:<name>` and returns a fixed result.
pub struct RecordingCheckpoint {
    name: String,
    when: When,
    error_code: Option<i32>,
    journal: Journal,
}

impl RecordingCheckpoint {
    pub fn ok(name: &str, when: When, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            when,
            error_code: None,
            journal: journal.clone(),
        })
    }

    pub fn failing(name: &str, when: When, code: i32, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            when,
            error_code: Some(code),
            journal: journal.clone(),
        })
    }
}

impl Checkpoint for RecordingCheckpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn when(&self) -> When {
        self.when
    }

    fn trigger(&self) -> CheckpointResult {
        self.journal.push(format!("checkpoint:{}", self.name));
        match self.error_code {
            None => Ok(()),
            Some(code) => Err(CheckpointError::Failed {
                name: self.name.clone(),
                code,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Environment and OS
// ---------------------------------------------------------------------------

/// Environment that reports a termination request after a fixed number
/// of refreshes (one refresh per cycle).
pub struct FakeEnvironment {
    journal: Journal,
    init_ok: bool,
    refresh_ok: bool,
    terminate_after: Option<u32>,
    refreshes: u32,
}

impl FakeEnvironment {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            init_ok: true,
            refresh_ok: true,
            terminate_after: None,
            refreshes: 0,
        }
    }

    pub fn terminate_after(mut self, cycles: u32) -> Self {
        self.terminate_after = Some(cycles);
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.init_ok = false;
        self
    }

    pub fn failing_refresh(mut self) -> Self {
        self.refresh_ok = false;
        self
    }
}

impl ExecutionEnvironment for FakeEnvironment {
    fn init(&mut self) -> bool {
        self.journal.push("env:init");
        self.init_ok
    }

    fn deinit(&mut self) -> bool {
        self.journal.push("env:deinit");
        true
    }

    fn set_state(&mut self, state: EnvState) {
        self.journal.push(format!("env:state:{state:?}"));
    }

    fn is_sig_term(&self) -> bool {
        self.terminate_after
            .is_some_and(|limit| self.refreshes >= limit)
    }

    fn refresh(&mut self) -> bool {
        self.refreshes += 1;
        self.journal.push("env:refresh");
        self.refresh_ok
    }
}

/// POSIX helper with switchable check results.
pub struct FakePosixHelper {
    journal: Journal,
    pub env_ok: bool,
    pub fpu_ok: bool,
    pub drop_ok: bool,
}

impl FakePosixHelper {
    pub fn new(journal: Journal) -> Self {
        Self {
            journal,
            env_ok: true,
            fpu_ok: true,
            drop_ok: true,
        }
    }
}

impl PosixHelper for FakePosixHelper {
    fn is_no_env_var_set(&self, pattern: &str, _exception: &str) -> bool {
        self.journal.push(format!("os:env_check:{pattern}"));
        self.env_ok
    }

    fn is_fpu_working(&self, _precision: f32) -> bool {
        self.journal.push("os:fpu");
        self.fpu_ok
    }

    fn drop_privileges(&mut self) -> bool {
        self.journal.push("os:drop_privileges");
        self.drop_ok
    }

    fn setup_oom_handler(&mut self) {
        self.journal.push("os:oom_handler");
    }
}
