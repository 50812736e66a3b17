// src/worker/mod.rs

//! Fork/join worker thread.
//!
//! - [`thread`] owns the OS thread, its state lock and condition variables.
//! - [`future`] is the one-shot result handed back per submission.
//! - [`placement`] pins the thread and sets its priority.

pub mod future;
pub mod placement;
pub mod thread;

pub use future::WorkerFuture;
pub use thread::{Task, TaskList, WorkerConfig, WorkerThread};
