// src/env/mod.rs

//! The process environment the executor runs in.
//!
//! The environment owns termination signalling and receives the executor's
//! coarse state. It is the only place that knows about OS signals.

pub mod signal;

pub use signal::SignalExecutionEnvironment;

use crate::types::EnvState;

pub trait ExecutionEnvironment: Send {
    fn init(&mut self) -> bool;
    fn deinit(&mut self) -> bool;
    fn set_state(&mut self, state: EnvState);
    /// Whether termination has been requested.
    fn is_sig_term(&self) -> bool;
    /// Called at the start of every cycle.
    fn refresh(&mut self) -> bool;
}

impl<T: ExecutionEnvironment + ?Sized> ExecutionEnvironment for Box<T> {
    fn init(&mut self) -> bool {
        (**self).init()
    }

    fn deinit(&mut self) -> bool {
        (**self).deinit()
    }

    fn set_state(&mut self, state: EnvState) {
        (**self).set_state(state)
    }

    fn is_sig_term(&self) -> bool {
        (**self).is_sig_term()
    }

    fn refresh(&mut self) -> bool {
        (**self).refresh()
    }
}
