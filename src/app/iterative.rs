// src/app/iterative.rs

//! Retry-bounded lifecycle driver for a single application.
//!
//! Each iterative phase runs through the same small state machine:
//!
//! ```text
//! budget left? ── no ──▶ fail
//!      │ yes
//! trigger gate ── closed ──▶ fail
//!      │ open (after waiting for the activation)
//! phase() ── Successful ──▶ ok
//!         ── Failed ─────▶ fail
//!         ── OnGoing ────▶ spend one attempt, loop
//! ```
//!
//! `execute` is a single `step()` and never retries.

use tracing::{debug, warn};

use crate::trigger::Trigger;
use crate::types::MethodState;

use super::attempts::{Attempts, PhaseAttempts};
use super::{Application, ApplicationHandler};

pub struct IterativeApplicationHandler<A, T> {
    application: A,
    trigger: T,
    attempts: PhaseAttempts,
}

impl<A: Application, T: Trigger> IterativeApplicationHandler<A, T> {
    pub fn new(application: A, trigger: T, attempts: PhaseAttempts) -> Self {
        Self {
            application,
            trigger,
            attempts,
        }
    }

    /// Remaining budgets, mostly for inspection in tests.
    pub fn attempts(&self) -> &PhaseAttempts {
        &self.attempts
    }

    pub fn application(&self) -> &A {
        &self.application
    }

    pub fn into_inner(self) -> A {
        self.application
    }
}

fn run_phase<A, T>(
    phase: &'static str,
    application: &mut A,
    trigger: &mut T,
    attempts: &mut Attempts,
    call: fn(&mut A) -> MethodState,
) -> bool
where
    A: Application,
    T: Trigger,
{
    while !attempts.is_exhausted() {
        if !trigger.check_trigger_condition_and_wait() {
            warn!(phase, attempt = attempts.current(), "trigger gate closed; phase abandoned");
            return false;
        }

        match call(application) {
            MethodState::Successful => {
                debug!(phase, attempt = attempts.current(), "phase succeeded");
                return true;
            }
            MethodState::Failed => {
                warn!(phase, attempt = attempts.current(), "phase failed");
                return false;
            }
            MethodState::OnGoing => {
                debug!(phase, attempt = attempts.current(), "phase still ongoing");
                attempts.increment();
            }
        }
    }

    warn!(phase, max_attempts = attempts.max(), "phase attempt budget exhausted");
    false
}

impl<A: Application, T: Trigger> ApplicationHandler for IterativeApplicationHandler<A, T> {
    fn initialize(&mut self) -> bool {
        run_phase(
            "initialize",
            &mut self.application,
            &mut self.trigger,
            &mut self.attempts.initialize,
            A::on_initialize,
        )
    }

    fn prepare_for_execute(&mut self) -> bool {
        run_phase(
            "prepare_for_execute",
            &mut self.application,
            &mut self.trigger,
            &mut self.attempts.prepare_for_execute,
            A::on_start,
        )
    }

    fn execute(&mut self) -> bool {
        matches!(
            self.application.step(),
            MethodState::Successful | MethodState::OnGoing
        )
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        run_phase(
            "prepare_for_shutdown",
            &mut self.application,
            &mut self.trigger,
            &mut self.attempts.prepare_for_shutdown,
            A::on_stop,
        )
    }

    fn shutdown(&mut self) -> bool {
        run_phase(
            "shutdown",
            &mut self.application,
            &mut self.trigger,
            &mut self.attempts.shutdown,
            A::on_terminate,
        )
    }
}
