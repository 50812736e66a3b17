#![allow(dead_code)]

use cyclexec::config::{
    CheckpointConfig, ConfigFile, ExecutorSection, ModuleConfig, RawConfigFile,
};
use cyclexec::errors::Result;
use cyclexec::types::When;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn executor(mut self, name: &str, period: &str, offset: &str) -> Self {
        self.config.executor = ExecutorSection {
            name: name.to_string(),
            period: period.to_string(),
            offset: offset.to_string(),
        };
        self
    }

    pub fn period(mut self, period: &str) -> Self {
        self.config.executor.period = period.to_string();
        self
    }

    pub fn offset(mut self, offset: &str) -> Self {
        self.config.executor.offset = offset.to_string();
        self
    }

    /// Same budget for every iterative phase.
    pub fn attempts(mut self, max: u32) -> Self {
        let a = &mut self.config.attempts;
        a.initialize = max;
        a.prepare_for_execute = max;
        a.prepare_for_shutdown = max;
        a.shutdown = max;
        self
    }

    pub fn worker(mut self, core_id: Option<usize>, priority: Option<i32>) -> Self {
        self.config.worker.core_id = core_id;
        self.config.worker.priority = priority;
        self
    }

    pub fn checkpoint(mut self, name: &str, when: When) -> Self {
        self.config.checkpoint.push(CheckpointConfig {
            name: name.to_string(),
            when,
        });
        self
    }

    pub fn module(mut self, name: &str, stage: u8, affinity: &str) -> Self {
        self.config.module.push(ModuleConfig {
            name: name.to_string(),
            stage,
            affinity: affinity.to_string(),
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
