// src/checkpoint/mod.rs

//! Named probes that bracket every execution cycle.
//!
//! Checkpoints registered for [`When::Before`] fire right before the
//! application step, those for [`When::After`] right after it. Insertion
//! order is trigger order.

pub mod container;
pub mod logging;

use std::sync::Arc;

use thiserror::Error;

use crate::types::When;

pub use container::{NullCheckpointContainer, OrderedCheckpointContainer};
pub use logging::LoggingCheckpoint;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckpointError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Checkpoint '{name}' failed with code {code}")]
    Failed { name: String, code: i32 },
}

pub type CheckpointResult = std::result::Result<(), CheckpointError>;

/// A probe run once per cycle.
///
/// `trigger` takes `&self` because the same instance may be registered in
/// several containers; implementations that keep state use interior
/// mutability.
pub trait Checkpoint: Send + Sync {
    /// Uniqueness key within one `When` bucket.
    fn name(&self) -> &str;
    fn when(&self) -> When;
    fn trigger(&self) -> CheckpointResult;
}

pub trait CheckpointContainer: Send {
    /// Register a checkpoint in the bucket selected by its `when()`.
    fn add_checkpoint(&mut self, checkpoint: Arc<dyn Checkpoint>) -> CheckpointResult;

    /// Fire every checkpoint of one bucket, in insertion order.
    fn trigger_checkpoints(&self, when: When) -> CheckpointResult;
}

impl<T: CheckpointContainer + ?Sized> CheckpointContainer for Box<T> {
    fn add_checkpoint(&mut self, checkpoint: Arc<dyn Checkpoint>) -> CheckpointResult {
        (**self).add_checkpoint(checkpoint)
    }

    fn trigger_checkpoints(&self, when: When) -> CheckpointResult {
        (**self).trigger_checkpoints(when)
    }
}
