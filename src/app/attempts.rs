// src/app/attempts.rs

use serde::Deserialize;

/// Retry budget for one lifecycle phase.
///
/// The counter only grows. Once `current >= max` the budget is spent for
/// the lifetime of the handler; a later call of the same phase fails
/// without invoking the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempts {
    max: u32,
    current: u32,
}

impl Attempts {
    pub fn new(max: u32) -> Self {
        Self { max, current: 0 }
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    pub fn current(&self) -> u32 {
        self.current
    }

    pub fn is_exhausted(&self) -> bool {
        self.current >= self.max
    }

    pub fn increment(&mut self) {
        self.current = self.current.saturating_add(1);
    }
}

/// Independent budgets for the four iterative phases.
///
/// `execute` has no budget: a cycle is a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseAttempts {
    pub initialize: Attempts,
    pub prepare_for_execute: Attempts,
    pub prepare_for_shutdown: Attempts,
    pub shutdown: Attempts,
}

impl PhaseAttempts {
    /// Same budget for every phase.
    pub fn uniform(max: u32) -> Self {
        Self {
            initialize: Attempts::new(max),
            prepare_for_execute: Attempts::new(max),
            prepare_for_shutdown: Attempts::new(max),
            shutdown: Attempts::new(max),
        }
    }
}

impl Default for PhaseAttempts {
    fn default() -> Self {
        Self::uniform(1)
    }
}

/// `[attempts]` section of the configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttemptsConfig {
    pub initialize: u32,
    pub prepare_for_execute: u32,
    pub prepare_for_shutdown: u32,
    pub shutdown: u32,
}

impl Default for AttemptsConfig {
    fn default() -> Self {
        Self {
            initialize: 3,
            prepare_for_execute: 3,
            prepare_for_shutdown: 3,
            shutdown: 3,
        }
    }
}

impl From<AttemptsConfig> for PhaseAttempts {
    fn from(cfg: AttemptsConfig) -> Self {
        Self {
            initialize: Attempts::new(cfg.initialize),
            prepare_for_execute: Attempts::new(cfg.prepare_for_execute),
            prepare_for_shutdown: Attempts::new(cfg.prepare_for_shutdown),
            shutdown: Attempts::new(cfg.shutdown),
        }
    }
}
