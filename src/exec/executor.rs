// src/exec/executor.rs

//! Top-level cyclic executor.
//!
//! The executor owns every collaborator behind a trait object and drives
//! the application through its lifecycle:
//!
//! ```text
//! init checks → initialize → prepare_for_execute → drop privileges
//!   → loop { wait → refresh → BEFORE → execute → AFTER }
//!   → prepare_for_shutdown → shutdown
//! ```
//!
//! The loop ends on a termination request or the first failing cycle. The
//! shutdown pair runs in both cases.

use tracing::{debug, error, info, info_span, warn};

use crate::app::ApplicationHandler;
use crate::checkpoint::CheckpointContainer;
use crate::env::ExecutionEnvironment;
use crate::os::PosixHelper;
use crate::trigger::Trigger;
use crate::types::{EnvState, When};

/// Default FPU self-test precision.
pub const DEFAULT_FPU_PRECISION: f32 = 0.000_001;

/// Startup check parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutorSettings {
    /// Used as the `executor` span name in logs.
    pub name: String,
    pub env_pattern: String,
    pub env_exception: String,
    pub fpu_precision: f32,
}

impl Default for ExecutorSettings {
    fn default() -> Self {
        Self {
            name: "cyclexec".to_string(),
            env_pattern: "^LD_PRELOAD=".to_string(),
            env_exception: "^LD_PRELOAD=$".to_string(),
            fpu_precision: DEFAULT_FPU_PRECISION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Uninitialized,
    Initialized,
    Running,
    Terminated,
    Failed,
}

/// Fields drop top to bottom: the application handler goes first and the
/// environment last, the reverse of how the builder wires them.
pub struct Executor {
    app: Option<Box<dyn ApplicationHandler>>,
    checkpoints: Box<dyn CheckpointContainer>,
    trigger: Box<dyn Trigger>,
    os_helper: Box<dyn PosixHelper>,
    env: Box<dyn ExecutionEnvironment>,
    settings: ExecutorSettings,
    state: ExecutorState,
    cycles: u64,
}

impl Executor {
    /// Wire the collaborators and install the OOM handler.
    pub fn new(
        env: Box<dyn ExecutionEnvironment>,
        mut os_helper: Box<dyn PosixHelper>,
        trigger: Box<dyn Trigger>,
        checkpoints: Box<dyn CheckpointContainer>,
        settings: ExecutorSettings,
    ) -> Self {
        os_helper.setup_oom_handler();
        Self {
            app: None,
            checkpoints,
            trigger,
            os_helper,
            env,
            settings,
            state: ExecutorState::Uninitialized,
            cycles: 0,
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    pub fn settings(&self) -> &ExecutorSettings {
        &self.settings
    }

    /// Cycles that completed both checkpoint buckets in the last `run()`.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn set_application_handler(&mut self, handler: Box<dyn ApplicationHandler>) {
        self.app = Some(handler);
    }

    /// Environment init, then the env-var and FPU checks. A successful
    /// init is never repeated.
    pub fn init(&mut self) -> bool {
        if self.state != ExecutorState::Uninitialized {
            return true;
        }

        if !self.env.init() {
            error!("execution environment initialization failed");
            return false;
        }
        if !self
            .os_helper
            .is_no_env_var_set(&self.settings.env_pattern, &self.settings.env_exception)
        {
            error!(pattern = %self.settings.env_pattern, "environment variable check failed");
            return false;
        }
        if !self.os_helper.is_fpu_working(self.settings.fpu_precision) {
            error!(precision = self.settings.fpu_precision, "FPU check failed");
            return false;
        }

        debug!("executor initialized");
        self.state = ExecutorState::Initialized;
        true
    }

    /// Run the full lifecycle. Returns `true` only if the loop ended on a
    /// termination request and both shutdown phases succeeded.
    pub fn run(&mut self) -> bool {
        let span = info_span!("executor", name = %self.settings.name);
        let _entered = span.enter();

        if self.app.is_none() {
            error!("application handler is not set");
            return false;
        }
        if !self.init() {
            error!("executor initialization failed");
            return false;
        }

        let success = self.run_lifecycle();
        self.state = if success {
            ExecutorState::Terminated
        } else {
            ExecutorState::Failed
        };
        info!(success, cycles = self.cycles, "executor finished");
        success
    }

    fn run_lifecycle(&mut self) -> bool {
        let Self {
            app,
            checkpoints,
            trigger,
            os_helper,
            env,
            state,
            cycles,
            ..
        } = self;
        let Some(app) = app.as_mut() else {
            return false;
        };

        if !app.initialize() {
            error!("application initialization failed");
            let _ = app.shutdown();
            return false;
        }

        env.set_state(EnvState::Running);

        if !app.prepare_for_execute() {
            error!("application is not ready to execute");
            let _ = app.prepare_for_shutdown();
            let _ = app.shutdown();
            return false;
        }

        if !os_helper.drop_privileges() {
            error!("unable to drop privileges");
            let _ = app.prepare_for_shutdown();
            let _ = app.shutdown();
            return false;
        }

        *state = ExecutorState::Running;
        *cycles = 0;
        let loop_ok = run_cycles(
            app.as_mut(),
            env.as_mut(),
            trigger.as_mut(),
            checkpoints.as_ref(),
            cycles,
        );

        let prepared = app.prepare_for_shutdown();
        if !prepared {
            error!("application failed to prepare for shutdown");
        }
        let terminated = app.shutdown();
        if !terminated {
            error!("application failed to shut down");
        }

        let success = loop_ok && prepared && terminated;
        if success {
            env.set_state(EnvState::Terminate);
        }
        success
    }
}

/// The cycle loop. Returns `true` if it ended on a termination request.
fn run_cycles(
    app: &mut dyn ApplicationHandler,
    env: &mut dyn ExecutionEnvironment,
    trigger: &mut dyn Trigger,
    checkpoints: &dyn CheckpointContainer,
    cycles: &mut u64,
) -> bool {
    while !env.is_sig_term() {
        // A closed gate does not skip the cycle.
        let _ = trigger.check_trigger_condition_and_wait();

        if !env.refresh() {
            warn!(cycle = *cycles, "environment refresh failed");
        }

        if let Err(err) = checkpoints.trigger_checkpoints(When::Before) {
            error!(cycle = *cycles, error = %err, "before-checkpoints failed");
            return false;
        }

        if !app.execute() {
            error!(cycle = *cycles, "application execution failed");
            return false;
        }

        if let Err(err) = checkpoints.trigger_checkpoints(When::After) {
            error!(cycle = *cycles, error = %err, "after-checkpoints failed");
            return false;
        }

        *cycles += 1;
        debug!(cycle = *cycles, "cycle complete");
    }

    info!(cycles = *cycles, "termination requested");
    true
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("settings", &self.settings)
            .field("state", &self.state)
            .field("cycles", &self.cycles)
            .field("has_application", &self.app.is_some())
            .finish()
    }
}
