// src/exec/mod.rs

//! Cyclic executor and its builder.
//!
//! - [`executor`] owns the lifecycle state machine and the cycle loop.
//! - [`builder`] wires environment, POSIX helper, trigger and checkpoints
//!   in construction order.

pub mod builder;
pub mod executor;

pub use builder::ExecutorBuilder;
pub use executor::{DEFAULT_FPU_PRECISION, Executor, ExecutorSettings, ExecutorState};
