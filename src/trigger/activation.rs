// src/trigger/activation.rs

//! Drift-compensated periodic activation.
//!
//! Wake-ups are placed on a global grid: the first deadline is the current
//! time rounded up to the next multiple of the period, plus the offset.
//! Every later deadline is derived from the previous *deadline*, never from
//! the time the thread actually woke up, so computation cost and sleep
//! jitter do not accumulate.

use std::time::Duration;

use tracing::debug;

use crate::errors::{CyclexecError, Result};
use crate::fatal;

use super::clock::{Clock, MonotonicClock};

/// Something that blocks until the next activation and reports how many
/// activations were missed.
pub trait TriggerActivation: Send {
    /// Wait for the next activation. Returns the number of missed cycles.
    fn wait(&mut self) -> u64;
}

/// Activation that fires every `period`, shifted by `offset` from the grid.
#[derive(Debug)]
pub struct PeriodicActivation<C: Clock = MonotonicClock> {
    clock: C,
    period: Duration,
    offset: Duration,
    /// `None` until the first `wait()`.
    next_execution_time: Option<Duration>,
}

impl PeriodicActivation<MonotonicClock> {
    /// Create an activation on the platform monotonic clock.
    ///
    /// A zero period is a configuration defect and aborts the process. Use
    /// [`PeriodicActivation::try_new`] to get an error instead.
    pub fn new(period: Duration, offset: Duration) -> Self {
        match Self::try_new(period, offset) {
            Ok(activation) => activation,
            Err(err) => fatal::abort_with(&err.to_string()),
        }
    }

    pub fn try_new(period: Duration, offset: Duration) -> Result<Self> {
        Self::with_clock(MonotonicClock, period, offset)
    }
}

impl<C: Clock> PeriodicActivation<C> {
    pub fn with_clock(clock: C, period: Duration, offset: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(CyclexecError::InvalidPeriod(period));
        }
        Ok(Self {
            clock,
            period,
            offset,
            next_execution_time: None,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn offset(&self) -> Duration {
        self.offset
    }

    /// Deadline of the next activation, once the first `wait()` has run.
    pub fn next_execution_time(&self) -> Option<Duration> {
        self.next_execution_time
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<C: Clock> TriggerActivation for PeriodicActivation<C> {
    fn wait(&mut self) -> u64 {
        let deadline = match self.next_execution_time {
            Some(deadline) => deadline,
            None => grid_start(self.clock.now(), self.period, self.offset),
        };

        self.clock.sleep_until(deadline);

        let now = self.clock.now();
        let (missed, next) = schedule_after(deadline, now, self.period);
        self.next_execution_time = Some(next);

        if missed > 0 {
            debug!(missed_cycles = missed, ?deadline, ?now, "activation overran its deadline");
        }
        missed
    }
}

/// First deadline: `now` rounded up to the next multiple of `period`,
/// plus `offset`. A `now` exactly on the grid still moves one full period.
pub fn grid_start(now: Duration, period: Duration, offset: Duration) -> Duration {
    let p = period.as_nanos();
    let n = now.as_nanos();
    from_nanos(n + (p - n % p)) + offset
}

/// Given the deadline just slept towards and the time observed after
/// waking, return `(missed_cycles, next_deadline)`.
///
/// `next_deadline` stays on the grid and is strictly later than `now`.
pub fn schedule_after(deadline: Duration, now: Duration, period: Duration) -> (u64, Duration) {
    let p = period.as_nanos();
    let missed = if now > deadline {
        ((now - deadline).as_nanos() / p) as u64
    } else {
        0
    };
    let next = deadline.as_nanos() + (u128::from(missed) + 1) * p;
    (missed, from_nanos(next))
}

fn from_nanos(nanos: u128) -> Duration {
    const NANOS_PER_SEC: u128 = 1_000_000_000;
    Duration::new(
        (nanos / NANOS_PER_SEC) as u64,
        (nanos % NANOS_PER_SEC) as u32,
    )
}
