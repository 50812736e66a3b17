// src/exec/builder.rs

//! Step-by-step wiring of an [`Executor`].
//!
//! Each step returns the next step type, so the collaborators can only be
//! supplied in construction order and none can be forgotten:
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use std::time::Duration;
//! # use cyclexec::checkpoint::LoggingCheckpoint;
//! # use cyclexec::env::SignalExecutionEnvironment;
//! # use cyclexec::exec::{ExecutorBuilder, ExecutorSettings};
//! # use cyclexec::os::SystemPosixHelper;
//! # use cyclexec::trigger::PeriodicTrigger;
//! # use cyclexec::types::When;
//! # fn main() -> Result<(), cyclexec::checkpoint::CheckpointError> {
//! let executor = ExecutorBuilder::new(ExecutorSettings::default())
//!     .environment(SignalExecutionEnvironment::new())
//!     .posix_helper(SystemPosixHelper::default())
//!     .trigger(PeriodicTrigger::periodic(Duration::from_millis(100), Duration::ZERO))
//!     .checkpoint(Arc::new(LoggingCheckpoint::new("kick", When::Before)))?
//!     .build();
//! # let _ = executor;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use crate::checkpoint::{
    Checkpoint, CheckpointContainer, CheckpointError, OrderedCheckpointContainer,
};
use crate::env::ExecutionEnvironment;
use crate::os::PosixHelper;
use crate::trigger::Trigger;

use super::executor::{Executor, ExecutorSettings};

pub struct ExecutorBuilder {
    settings: ExecutorSettings,
}

impl ExecutorBuilder {
    pub fn new(settings: ExecutorSettings) -> Self {
        Self { settings }
    }

    pub fn environment<E>(self, env: E) -> PosixHelperStep
    where
        E: ExecutionEnvironment + 'static,
    {
        PosixHelperStep {
            settings: self.settings,
            env: Box::new(env),
        }
    }
}

pub struct PosixHelperStep {
    settings: ExecutorSettings,
    env: Box<dyn ExecutionEnvironment>,
}

impl PosixHelperStep {
    pub fn posix_helper<P>(self, helper: P) -> TriggerStep
    where
        P: PosixHelper + 'static,
    {
        TriggerStep {
            settings: self.settings,
            env: self.env,
            os_helper: Box::new(helper),
        }
    }
}

pub struct TriggerStep {
    settings: ExecutorSettings,
    env: Box<dyn ExecutionEnvironment>,
    os_helper: Box<dyn PosixHelper>,
}

impl TriggerStep {
    /// The checkpoint container defaults to an empty
    /// [`OrderedCheckpointContainer`].
    pub fn trigger<T>(self, trigger: T) -> CheckpointStep
    where
        T: Trigger + 'static,
    {
        CheckpointStep {
            settings: self.settings,
            env: self.env,
            os_helper: self.os_helper,
            trigger: Box::new(trigger),
            checkpoints: Box::new(OrderedCheckpointContainer::new()),
        }
    }
}

pub struct CheckpointStep {
    settings: ExecutorSettings,
    env: Box<dyn ExecutionEnvironment>,
    os_helper: Box<dyn PosixHelper>,
    trigger: Box<dyn Trigger>,
    checkpoints: Box<dyn CheckpointContainer>,
}

impl CheckpointStep {
    /// Replace the container. Checkpoints added earlier are discarded.
    pub fn checkpoint_container<C>(mut self, container: C) -> Self
    where
        C: CheckpointContainer + 'static,
    {
        self.checkpoints = Box::new(container);
        self
    }

    pub fn checkpoint(mut self, checkpoint: Arc<dyn Checkpoint>) -> Result<Self, CheckpointError> {
        self.checkpoints.add_checkpoint(checkpoint)?;
        Ok(self)
    }

    pub fn checkpoints<I>(mut self, checkpoints: I) -> Result<Self, CheckpointError>
    where
        I: IntoIterator<Item = Arc<dyn Checkpoint>>,
    {
        for checkpoint in checkpoints {
            self.checkpoints.add_checkpoint(checkpoint)?;
        }
        Ok(self)
    }

    pub fn build(self) -> Executor {
        Executor::new(
            self.env,
            self.os_helper,
            self.trigger,
            self.checkpoints,
            self.settings,
        )
    }
}
