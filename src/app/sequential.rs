// src/app/sequential.rs

//! Handlers that run their children one after another.
//!
//! Both stop at the first failure within a phase. Neither retries, so an
//! `OnGoing` lifecycle result counts as a failure here.

use tracing::warn;

use crate::types::MethodState;

use super::{Application, ApplicationHandler};

/// Drives a list of applications in order.
pub struct SequentialListHandler {
    apps: Vec<Box<dyn Application>>,
}

impl SequentialListHandler {
    pub fn new(apps: Vec<Box<dyn Application>>) -> Self {
        Self { apps }
    }

    /// Handler for a single application run exactly once per phase.
    pub fn single(app: Box<dyn Application>) -> Self {
        Self { apps: vec![app] }
    }

    pub fn len(&self) -> usize {
        self.apps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn all_successful(&mut self, phase: &str, call: fn(&mut dyn Application) -> MethodState) -> bool {
        for (index, app) in self.apps.iter_mut().enumerate() {
            let state = call(app.as_mut());
            if state != MethodState::Successful {
                warn!(phase, app = index, ?state, "application did not succeed");
                return false;
            }
        }
        true
    }
}

impl ApplicationHandler for SequentialListHandler {
    fn initialize(&mut self) -> bool {
        self.all_successful("initialize", |a| a.on_initialize())
    }

    fn prepare_for_execute(&mut self) -> bool {
        self.all_successful("prepare_for_execute", |a| a.on_start())
    }

    fn execute(&mut self) -> bool {
        self.all_successful("execute", |a| a.step())
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        self.all_successful("prepare_for_shutdown", |a| a.on_stop())
    }

    fn shutdown(&mut self) -> bool {
        self.all_successful("shutdown", |a| a.on_terminate())
    }
}

/// Composes several handlers; each phase is forwarded in order.
#[derive(Default)]
pub struct SequentialHandlerContainer {
    handlers: Vec<Box<dyn ApplicationHandler>>,
}

impl SequentialHandlerContainer {
    pub fn new(handlers: Vec<Box<dyn ApplicationHandler>>) -> Self {
        Self { handlers }
    }

    pub fn push(&mut self, handler: Box<dyn ApplicationHandler>) {
        self.handlers.push(handler);
    }

    fn all(&mut self, call: fn(&mut dyn ApplicationHandler) -> bool) -> bool {
        self.handlers.iter_mut().all(|h| call(h.as_mut()))
    }
}

impl ApplicationHandler for SequentialHandlerContainer {
    fn initialize(&mut self) -> bool {
        self.all(|h| h.initialize())
    }

    fn prepare_for_execute(&mut self) -> bool {
        self.all(|h| h.prepare_for_execute())
    }

    fn execute(&mut self) -> bool {
        self.all(|h| h.execute())
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        self.all(|h| h.prepare_for_shutdown())
    }

    fn shutdown(&mut self) -> bool {
        self.all(|h| h.shutdown())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    struct Fixed {
        state: MethodState,
        steps: Arc<AtomicU32>,
    }

    impl Application for Fixed {
        fn on_initialize(&mut self) -> MethodState {
            self.state
        }
        fn on_start(&mut self) -> MethodState {
            self.state
        }
        fn step(&mut self) -> MethodState {
            self.steps.fetch_add(1, Ordering::SeqCst);
            self.state
        }
        fn on_stop(&mut self) -> MethodState {
            self.state
        }
        fn on_terminate(&mut self) -> MethodState {
            self.state
        }
    }

    fn app(state: MethodState, steps: &Arc<AtomicU32>) -> Box<dyn Application> {
        Box::new(Fixed {
            state,
            steps: Arc::clone(steps),
        })
    }

    #[test]
    fn list_short_circuits_on_first_failure() {
        let steps = Arc::new(AtomicU32::new(0));
        let mut h = SequentialListHandler::new(vec![
            app(MethodState::Failed, &steps),
            app(MethodState::Successful, &steps),
        ]);
        assert!(!h.execute());
        assert_eq!(steps.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn list_treats_ongoing_as_failure() {
        let steps = Arc::new(AtomicU32::new(0));
        let mut h = SequentialListHandler::single(app(MethodState::OnGoing, &steps));
        assert!(!h.initialize());
    }

    #[test]
    fn empty_list_succeeds() {
        let mut h = SequentialListHandler::new(Vec::new());
        assert!(h.is_empty());
        assert!(h.initialize());
        assert!(h.execute());
    }

    #[test]
    fn container_forwards_in_order_and_stops_early() {
        let steps = Arc::new(AtomicU32::new(0));
        let mut c = SequentialHandlerContainer::new(vec![
            Box::new(SequentialListHandler::single(app(MethodState::Successful, &steps))),
            Box::new(SequentialListHandler::single(app(MethodState::Failed, &steps))),
            Box::new(SequentialListHandler::single(app(MethodState::Successful, &steps))),
        ]);
        assert!(!c.execute());
        assert_eq!(steps.load(Ordering::SeqCst), 2);
    }
}
