// src/checkpoint/container.rs

use std::sync::Arc;

use tracing::{debug, warn};

use crate::types::When;

use super::{Checkpoint, CheckpointContainer, CheckpointError, CheckpointResult};

/// Two append-only lists, one per [`When`].
#[derive(Default)]
pub struct OrderedCheckpointContainer {
    before: Vec<Arc<dyn Checkpoint>>,
    after: Vec<Arc<dyn Checkpoint>>,
}

impl OrderedCheckpointContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn bucket(&self, when: When) -> &[Arc<dyn Checkpoint>] {
        match when {
            When::Before => &self.before,
            When::After => &self.after,
        }
    }

    /// Names in one bucket, in trigger order.
    pub fn names(&self, when: When) -> Vec<&str> {
        self.bucket(when).iter().map(|c| c.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.before.len() + self.after.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CheckpointContainer for OrderedCheckpointContainer {
    fn add_checkpoint(&mut self, checkpoint: Arc<dyn Checkpoint>) -> CheckpointResult {
        let when = checkpoint.when();
        let bucket = match when {
            When::Before => &mut self.before,
            When::After => &mut self.after,
        };

        let duplicate = bucket
            .iter()
            .any(|c| Arc::ptr_eq(c, &checkpoint) || c.name() == checkpoint.name());
        if duplicate {
            return Err(CheckpointError::InvalidArgument(format!(
                "checkpoint '{}' already registered for {when}",
                checkpoint.name()
            )));
        }

        debug!(checkpoint = checkpoint.name(), %when, "checkpoint registered");
        bucket.push(checkpoint);
        Ok(())
    }

    /// Keeps going after a failure. Only the last error is returned.
    fn trigger_checkpoints(&self, when: When) -> CheckpointResult {
        let mut last = Ok(());
        for checkpoint in self.bucket(when) {
            if let Err(err) = checkpoint.trigger() {
                warn!(checkpoint = checkpoint.name(), %when, error = %err, "checkpoint failed");
                last = Err(err);
            }
        }
        last
    }
}

/// Container that accepts everything and fires nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCheckpointContainer;

impl CheckpointContainer for NullCheckpointContainer {
    fn add_checkpoint(&mut self, _checkpoint: Arc<dyn Checkpoint>) -> CheckpointResult {
        Ok(())
    }

    fn trigger_checkpoints(&self, _when: When) -> CheckpointResult {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Fixed {
        name: &'static str,
        when: When,
        code: Option<i32>,
        log: Arc<Mutex<Vec<&'static str>>>,
    }

    impl Checkpoint for Fixed {
        fn name(&self) -> &str {
            self.name
        }
        fn when(&self) -> When {
            self.when
        }
        fn trigger(&self) -> CheckpointResult {
            self.log.lock().unwrap().push(self.name);
            match self.code {
                None => Ok(()),
                Some(code) => Err(CheckpointError::Failed {
                    name: self.name.to_string(),
                    code,
                }),
            }
        }
    }

    fn cp(
        name: &'static str,
        when: When,
        code: Option<i32>,
        log: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Arc<dyn Checkpoint> {
        Arc::new(Fixed {
            name,
            when,
            code,
            log: Arc::clone(log),
        })
    }

    #[test]
    fn duplicate_name_same_bucket_is_rejected() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        assert!(c.add_checkpoint(cp("wd", When::Before, None, &log)).is_ok());
        let err = c.add_checkpoint(cp("wd", When::Before, None, &log)).unwrap_err();
        assert!(matches!(err, CheckpointError::InvalidArgument(_)));
        assert_eq!(c.names(When::Before), vec!["wd"]);
    }

    #[test]
    fn same_name_different_bucket_is_accepted() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        assert!(c.add_checkpoint(cp("wd", When::Before, None, &log)).is_ok());
        assert!(c.add_checkpoint(cp("wd", When::After, None, &log)).is_ok());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn same_instance_twice_is_rejected() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        let one = cp("once", When::After, None, &log);
        assert!(c.add_checkpoint(Arc::clone(&one)).is_ok());
        assert!(c.add_checkpoint(one).is_err());
    }

    #[test]
    fn earlier_error_survives_later_success() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        c.add_checkpoint(cp("c1", When::Before, Some(7), &log)).unwrap();
        c.add_checkpoint(cp("c2", When::Before, None, &log)).unwrap();

        let err = c.trigger_checkpoints(When::Before).unwrap_err();
        assert_eq!(
            err,
            CheckpointError::Failed {
                name: "c1".into(),
                code: 7
            }
        );
        assert_eq!(*log.lock().unwrap(), vec!["c1", "c2"]);
    }

    #[test]
    fn last_error_wins() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        c.add_checkpoint(cp("a", When::After, Some(1), &log)).unwrap();
        c.add_checkpoint(cp("b", When::After, Some(2), &log)).unwrap();
        c.add_checkpoint(cp("c", When::After, None, &log)).unwrap();

        match c.trigger_checkpoints(When::After) {
            Err(CheckpointError::Failed { code, .. }) => assert_eq!(code, 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn buckets_fire_independently() {
        let log = Arc::default();
        let mut c = OrderedCheckpointContainer::new();
        c.add_checkpoint(cp("b1", When::Before, None, &log)).unwrap();
        c.add_checkpoint(cp("a1", When::After, Some(3), &log)).unwrap();

        assert!(c.trigger_checkpoints(When::Before).is_ok());
        assert_eq!(*log.lock().unwrap(), vec!["b1"]);
    }

    #[test]
    fn null_container_is_inert() {
        let log = Arc::default();
        let mut c = NullCheckpointContainer;
        assert!(c.add_checkpoint(cp("x", When::Before, Some(1), &log)).is_ok());
        assert!(c.trigger_checkpoints(When::Before).is_ok());
        assert!(log.lock().unwrap().is_empty());
    }
}
