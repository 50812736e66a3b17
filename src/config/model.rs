// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::app::attempts::AttemptsConfig;
use crate::exec::{DEFAULT_FPU_PRECISION, ExecutorSettings};
use crate::os::PrivilegeConfig;
use crate::types::{Stage, TaskAffinity, When};
use crate::worker::WorkerConfig;

/// Configuration as read from TOML, before validation.
///
/// ```toml
/// [executor]
/// name = "hello-world"
/// period = "100ms"
/// offset = "0ms"
///
/// [attempts]
/// initialize = 3
///
/// [worker]
/// core_id = 1
///
/// [[checkpoint]]
/// name = "watchdog-kick"
/// when = "before"
///
/// [[module]]
/// name = "sensor"
/// stage = 1
/// affinity = "worker"
/// ```
///
/// Every section is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfigFile {
    #[serde(default)]
    pub executor: ExecutorSection,

    #[serde(default)]
    pub attempts: AttemptsConfig,

    #[serde(default)]
    pub worker: WorkerSection,

    #[serde(default)]
    pub checks: ChecksSection,

    #[serde(default)]
    pub privileges: PrivilegeConfig,

    #[serde(default)]
    pub checkpoint: Vec<CheckpointConfig>,

    #[serde(default)]
    pub module: Vec<ModuleConfig>,
}

/// `[executor]` section. Durations stay strings until validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutorSection {
    pub name: String,
    pub period: String,
    pub offset: String,
}

impl Default for ExecutorSection {
    fn default() -> Self {
        Self {
            name: "cyclexec".to_string(),
            period: "100ms".to_string(),
            offset: "0ms".to_string(),
        }
    }
}

/// `[worker]` section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerSection {
    pub core_id: Option<usize>,
    pub priority: Option<i32>,
}

/// `[checks]` section: startup sanity checks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChecksSection {
    /// Regex over `KEY=VALUE`; a match fails startup.
    pub env_pattern: String,
    /// Regex over `KEY=VALUE`; exempts an otherwise matching variable.
    pub env_exception: String,
    pub fpu_precision: f32,
}

impl Default for ChecksSection {
    fn default() -> Self {
        let settings = ExecutorSettings::default();
        Self {
            env_pattern: settings.env_pattern,
            env_exception: settings.env_exception,
            fpu_precision: DEFAULT_FPU_PRECISION,
        }
    }
}

/// `[[checkpoint]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckpointConfig {
    pub name: String,
    pub when: When,
}

/// `[[module]]` entry. `affinity` is checked during validation so the
/// error can name the module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleConfig {
    pub name: String,
    pub stage: u8,
    pub affinity: String,
}

/// Validated `[executor]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    pub name: String,
    pub period: Duration,
    pub offset: Duration,
}

/// Validated `[[module]]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSpec {
    pub name: String,
    pub stage: Stage,
    pub affinity: TaskAffinity,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (or the loader), so
/// holders can rely on every invariant checked in `validate.rs`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub executor: ExecutorConfig,
    pub attempts: AttemptsConfig,
    pub worker: WorkerConfig,
    pub checks: ChecksSection,
    pub privileges: PrivilegeConfig,
    pub checkpoints: Vec<CheckpointConfig>,
    pub modules: Vec<ModuleSpec>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        executor: ExecutorConfig,
        raw: RawConfigFile,
        modules: Vec<ModuleSpec>,
    ) -> Self {
        Self {
            executor,
            attempts: raw.attempts,
            worker: WorkerConfig {
                core_id: raw.worker.core_id,
                priority: raw.worker.priority,
                ..WorkerConfig::default()
            },
            checks: raw.checks,
            privileges: raw.privileges,
            checkpoints: raw.checkpoint,
            modules,
        }
    }

    pub fn executor_settings(&self) -> ExecutorSettings {
        ExecutorSettings {
            name: self.executor.name.clone(),
            env_pattern: self.checks.env_pattern.clone(),
            env_exception: self.checks.env_exception.clone(),
            fpu_precision: self.checks.fpu_precision,
        }
    }
}
