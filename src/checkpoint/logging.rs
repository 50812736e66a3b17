// src/checkpoint/logging.rs

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::info;

use crate::types::When;

use super::{Checkpoint, CheckpointResult};

/// Checkpoint that logs every trigger and always succeeds.
///
/// Placeholder for watchdog kicks or health probes that are configured by
/// name but have no backing implementation yet.
#[derive(Debug)]
pub struct LoggingCheckpoint {
    name: String,
    when: When,
    fired: AtomicU64,
}

impl LoggingCheckpoint {
    pub fn new(name: impl Into<String>, when: When) -> Self {
        let name = name.into();
        info!(checkpoint = %name, %when, "logging checkpoint created");
        Self {
            name,
            when,
            fired: AtomicU64::new(0),
        }
    }

    pub fn fired(&self) -> u64 {
        self.fired.load(Ordering::Relaxed)
    }
}

impl Checkpoint for LoggingCheckpoint {
    fn name(&self) -> &str {
        &self.name
    }

    fn when(&self) -> When {
        self.when
    }

    fn trigger(&self) -> CheckpointResult {
        let count = self.fired.fetch_add(1, Ordering::Relaxed) + 1;
        info!(checkpoint = %self.name, when = %self.when, count, "checkpoint triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_triggers() {
        let c = LoggingCheckpoint::new("probe", When::After);
        assert!(c.trigger().is_ok());
        assert!(c.trigger().is_ok());
        assert_eq!(c.fired(), 2);
        assert_eq!(c.name(), "probe");
        assert_eq!(c.when(), When::After);
    }
}
