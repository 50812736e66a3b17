// src/demo/hello.rs

use tracing::info;

use crate::app::Application;
use crate::env::signal::TerminationFlag;
use crate::types::MethodState;

/// Minimal application: logs each lifecycle call and counts steps.
///
/// With a cycle limit it requests termination itself once the limit is
/// reached, which lets the binary run a bounded number of cycles.
#[derive(Debug)]
pub struct HelloWorldApp {
    steps: u64,
    limit: Option<u64>,
    stop: TerminationFlag,
}

impl HelloWorldApp {
    pub fn new(stop: TerminationFlag, limit: Option<u64>) -> Self {
        Self {
            steps: 0,
            limit,
            stop,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }
}

impl Application for HelloWorldApp {
    fn on_initialize(&mut self) -> MethodState {
        info!("hello world: initialize");
        MethodState::Successful
    }

    fn on_start(&mut self) -> MethodState {
        info!("hello world: start");
        MethodState::Successful
    }

    fn step(&mut self) -> MethodState {
        self.steps += 1;
        info!(step = self.steps, "hello world");
        if self.limit.is_some_and(|limit| self.steps >= limit) {
            info!(steps = self.steps, "cycle limit reached");
            self.stop.request();
        }
        MethodState::Successful
    }

    fn on_stop(&mut self) -> MethodState {
        info!("hello world: stop");
        MethodState::Successful
    }

    fn on_terminate(&mut self) -> MethodState {
        info!(steps = self.steps, "hello world: terminate");
        MethodState::Successful
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_stop_at_limit() {
        let flag = TerminationFlag::default();
        let mut app = HelloWorldApp::new(flag.clone(), Some(2));
        app.step();
        assert!(!flag.is_requested());
        app.step();
        assert!(flag.is_requested());
        assert_eq!(app.steps(), 2);
    }

    #[test]
    fn no_limit_never_stops() {
        let flag = TerminationFlag::default();
        let mut app = HelloWorldApp::new(flag.clone(), None);
        for _ in 0..10 {
            assert_eq!(app.step(), MethodState::Successful);
        }
        assert!(!flag.is_requested());
    }
}
