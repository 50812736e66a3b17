// src/demo/module.rs

use std::thread;

use tracing::debug;

use crate::app::ApplicationHandler;
use crate::types::{Stage, TaskAffinity};

/// Fork/join module that only logs where and when it runs.
#[derive(Debug)]
pub struct DemoModule {
    name: String,
    stage: Stage,
    affinity: TaskAffinity,
    executions: u64,
}

impl DemoModule {
    pub fn new(name: impl Into<String>, stage: Stage, affinity: TaskAffinity) -> Self {
        Self {
            name: name.into(),
            stage,
            affinity,
            executions: 0,
        }
    }

    pub fn executions(&self) -> u64 {
        self.executions
    }

    fn phase(&self, phase: &str) -> bool {
        debug!(module = %self.name, %phase, "module phase");
        true
    }
}

impl ApplicationHandler for DemoModule {
    fn initialize(&mut self) -> bool {
        self.phase("initialize")
    }

    fn prepare_for_execute(&mut self) -> bool {
        self.phase("prepare_for_execute")
    }

    fn execute(&mut self) -> bool {
        self.executions += 1;
        let current = thread::current();
        debug!(
            module = %self.name,
            stage = %self.stage,
            affinity = ?self.affinity,
            thread = current.name().unwrap_or("unnamed"),
            execution = self.executions,
            "module execute"
        );
        true
    }

    fn prepare_for_shutdown(&mut self) -> bool {
        self.phase("prepare_for_shutdown")
    }

    fn shutdown(&mut self) -> bool {
        self.phase("shutdown")
    }
}
