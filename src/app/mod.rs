// src/app/mod.rs

//! Application lifecycle and the handlers that drive it.
//!
//! An [`Application`] is user logic reporting a tri-state [`MethodState`]
//! per lifecycle call. An [`ApplicationHandler`] folds those results into
//! the plain success/failure the executor acts on, adding whatever policy
//! it implements (retries, fork/join, sequencing).

pub mod attempts;
pub mod fork_join;
pub mod iterative;
pub mod sequential;

pub use attempts::{Attempts, PhaseAttempts};
pub use fork_join::{ForkJoinModuleHandler, ForkMap, SharedModule};
pub use iterative::IterativeApplicationHandler;
pub use sequential::{SequentialHandlerContainer, SequentialListHandler};

use crate::types::MethodState;

/// User application logic.
pub trait Application: Send {
    fn on_initialize(&mut self) -> MethodState;
    fn on_start(&mut self) -> MethodState;
    /// One cycle of work. `OnGoing` means "keep running".
    fn step(&mut self) -> MethodState;
    fn on_stop(&mut self) -> MethodState;
    fn on_terminate(&mut self) -> MethodState;
}

/// Lifecycle phases as seen by the executor.
pub trait ApplicationHandler: Send {
    fn initialize(&mut self) -> bool;
    fn prepare_for_execute(&mut self) -> bool;
    fn execute(&mut self) -> bool;
    fn prepare_for_shutdown(&mut self) -> bool;
    fn shutdown(&mut self) -> bool;
}

impl<T: Application + ?Sized> Application for Box<T> {
    fn on_initialize(&mut self) -> MethodState {
        (**self).on_initialize()
    }

    fn on_start(&mut self) -> MethodState {
        (**self).on_start()
    }

    fn step(&mut self) -> MethodState {
        (**self).step()
    }

    fn on_stop(&mut self) -> MethodState {
        (**self).on_stop()
    }

    fn on_terminate(&mut self) -> MethodState {
        (**self).on_terminate()
    }
}

impl<T: ApplicationHandler + ?Sized> ApplicationHandler for Box<T> {
    fn initialize(&mut self) -> bool {
        (**self).initialize()
    }

    fn prepare_for_execute(&mut self) -> bool {
        (**self).prepare_for_execute()
    }

    fn execute(&mut self) -> bool {
        (**self).execute()
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        (**self).prepare_for_shutdown()
    }

    fn shutdown(&mut self) -> bool {
        (**self).shutdown()
    }
}
