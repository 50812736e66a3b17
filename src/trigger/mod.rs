// src/trigger/mod.rs

//! Cycle triggering.
//!
//! - [`clock`] wraps the monotonic clock and absolute-time sleep.
//! - [`activation`] computes and sleeps until the next grid deadline.
//! - [`condition`] holds the gate that decides whether to wait at all.
//!
//! A [`Trigger`] composes a condition with an activation. The executor and
//! the iterative application handler only see the trait.

pub mod activation;
pub mod clock;
pub mod condition;

use std::time::Duration;

use tracing::warn;

pub use activation::{PeriodicActivation, TriggerActivation};
pub use clock::{Clock, MonotonicClock};
pub use condition::{NullTriggerCondition, TriggerCondition};

/// Gate + wait, as seen by the executor loop.
pub trait Trigger: Send {
    /// If the condition holds, wait for the next activation and return
    /// `true`. Otherwise return `false` immediately.
    fn check_trigger_condition_and_wait(&mut self) -> bool;
}

impl<T: Trigger + ?Sized> Trigger for Box<T> {
    fn check_trigger_condition_and_wait(&mut self) -> bool {
        (**self).check_trigger_condition_and_wait()
    }
}

/// Trigger built from an activation and a condition.
#[derive(Debug)]
pub struct SimpleTrigger<A, C> {
    activation: A,
    condition: C,
}

/// The production trigger: periodic activation, no gating.
pub type PeriodicTrigger<K = MonotonicClock> =
    SimpleTrigger<PeriodicActivation<K>, NullTriggerCondition>;

impl<A: TriggerActivation, C: TriggerCondition> SimpleTrigger<A, C> {
    pub fn new(activation: A, condition: C) -> Self {
        Self {
            activation,
            condition,
        }
    }

    pub fn activation(&self) -> &A {
        &self.activation
    }
}

impl PeriodicTrigger<MonotonicClock> {
    /// Periodic trigger on the monotonic clock. Aborts on a zero period.
    pub fn periodic(period: Duration, offset: Duration) -> Self {
        SimpleTrigger::new(PeriodicActivation::new(period, offset), NullTriggerCondition)
    }
}

impl<A: TriggerActivation, C: TriggerCondition> Trigger for SimpleTrigger<A, C> {
    fn check_trigger_condition_and_wait(&mut self) -> bool {
        if !self.condition.is_triggered() {
            return false;
        }
        // The missed-cycle count is not propagated to the caller; it is
        // only surfaced in the log.
        let missed = self.activation.wait();
        if missed > 0 {
            warn!(missed_cycles = missed, "cycle deadline missed");
        }
        true
    }
}
